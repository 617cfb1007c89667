//! Host-provided emission configuration.
//!
//! The `debug` switch is an explicit value threaded through
//! [`crate::emit_class`] rather than implicit process-wide global state.

/// Configuration passed into [`crate::emit_class`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitConfig {
    /// Enables local variable table / debug bookkeeping. Has no
    /// effect when the `local-variable-tables` feature is compiled out; see
    /// [`crate::writer::method_writer::MethodWriter::debug_enabled`].
    pub debug: bool,
}

impl EmitConfig {
    /// A config with `debug` disabled; the common default for embedders
    /// that never read the `CLASSGEN_DEBUG` environment convention below.
    #[must_use]
    pub const fn new() -> Self {
        EmitConfig { debug: false }
    }

    /// An opt-in convenience constructor for hosts that want the `debug`
    /// flag driven by an environment variable instead of wiring it through
    /// explicitly. The library itself never reads the environment on its
    /// own; only a caller that invokes this constructor does.
    #[instability::unstable(feature = "env-config")]
    #[must_use]
    pub fn from_env() -> Self {
        let debug = std::env::var("CLASSGEN_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        EmitConfig { debug }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_debug_off() {
        assert!(!EmitConfig::new().debug);
        assert_eq!(EmitConfig::new(), EmitConfig::default());
    }
}
