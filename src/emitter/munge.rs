//! Deterministic name munging.
//!
//! Field and method names pass through this before they reach the
//! constant pool; `<init>`/`<clinit>` bypass it entirely since they are
//! not user-chosen names in the first place.

const ILLEGAL: [char; 6] = ['.', ';', '[', '/', '<', '>'];

/// Escapes characters illegal in a JVM identifier with a fixed `$XXXX` hex
/// scheme. `<init>`/`<clinit>` are returned verbatim.
#[must_use]
pub fn munge(name: &str) -> String {
    if name == "<init>" || name == "<clinit>" {
        return name.to_string();
    }
    if !name.contains(ILLEGAL) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if ILLEGAL.contains(&c) {
            out.push_str(&format!("${:04x}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leaves_plain_identifiers_untouched() {
        assert_eq!(munge("getValue"), "getValue");
    }

    #[test]
    fn bypasses_special_names() {
        assert_eq!(munge("<init>"), "<init>");
        assert_eq!(munge("<clinit>"), "<clinit>");
    }

    #[test]
    fn escapes_illegal_characters() {
        assert_eq!(munge("a.b"), "a$002eb");
        assert_eq!(munge("x;y"), "x$003by");
        assert_eq!(munge("a<b>c"), "a$003cb$003ec");
    }
}
