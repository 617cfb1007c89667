//! A minimal class-file reader used only by the scenario tests.
//!
//! This is intentionally not a general-purpose class reader: it recognizes
//! exactly the constant pool tags and attributes this crate itself ever
//! emits, and panics on anything else.

pub struct ClassFile<'a> {
    bytes: &'a [u8],
    pos: usize,
    utf8: Vec<Option<String>>,
}

impl<'a> ClassFile<'a> {
    #[must_use]
    pub fn parse(bytes: &'a [u8]) -> Self {
        let mut r = ClassFile {
            bytes,
            pos: 0,
            utf8: Vec::new(),
        };
        assert_eq!(r.u32(), 0xCAFE_BABE, "bad magic");
        let _minor = r.u16();
        let major = r.u16();
        assert_eq!(major, 52, "expected major version 52");

        let cp_count = r.u16();
        r.utf8 = vec![None; cp_count as usize];
        let mut index = 1usize;
        while index < cp_count as usize {
            let tag = r.u8();
            match tag {
                1 => {
                    let len = r.u16() as usize;
                    let s = String::from_utf8(r.bytes[r.pos..r.pos + len].to_vec()).unwrap();
                    r.pos += len;
                    r.utf8[index] = Some(s);
                }
                3 | 4 => {
                    r.u32();
                }
                5 | 6 => {
                    r.u32();
                    r.u32();
                    index += 1; // 8-byte constants occupy two pool slots
                }
                7 | 8 | 16 | 19 | 20 => {
                    r.u16();
                }
                9 | 10 | 11 | 12 | 18 => {
                    r.u16();
                    r.u16();
                }
                15 => {
                    r.u8();
                    r.u16();
                }
                other => panic!("unrecognized constant pool tag {other}"),
            }
            index += 1;
        }

        r.u16(); // access_flags
        r.u16(); // this_class
        r.u16(); // super_class
        let interfaces_count = r.u16();
        for _ in 0..interfaces_count {
            r.u16();
        }

        let fields_count = r.u16();
        for _ in 0..fields_count {
            r.u16(); // access
            r.u16(); // name_index
            r.u16(); // descriptor_index
            r.skip_attributes();
        }
        r
    }

    fn u8(&mut self) -> u8 {
        let v = self.bytes[self.pos];
        self.pos += 1;
        v
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_be_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn u32(&mut self) -> u32 {
        let v = u32::from_be_bytes(self.bytes[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn skip_attributes(&mut self) {
        let count = self.u16();
        for _ in 0..count {
            self.u16(); // name_index
            let len = self.u32() as usize;
            self.pos += len;
        }
    }

    /// Finds the named method and returns the raw bytecode of its `Code`
    /// attribute, plus `(max_stack, max_locals)`.
    #[must_use]
    pub fn method_code(&mut self, name: &str) -> (Vec<u8>, u16, u16) {
        let methods_count = self.u16();
        for _ in 0..methods_count {
            self.u16(); // access
            let name_index = self.u16();
            self.u16(); // descriptor_index
            let attr_count = self.u16();
            let is_match = self.utf8[name_index as usize].as_deref() == Some(name);
            let mut found = None;
            for _ in 0..attr_count {
                let attr_name_index = self.u16();
                let len = self.u32() as usize;
                let attr_start = self.pos;
                if is_match && self.utf8[attr_name_index as usize].as_deref() == Some("Code") {
                    let max_stack = u16::from_be_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
                    let max_locals =
                        u16::from_be_bytes([self.bytes[self.pos + 2], self.bytes[self.pos + 3]]);
                    let code_len = u32::from_be_bytes(
                        self.bytes[self.pos + 4..self.pos + 8].try_into().unwrap(),
                    ) as usize;
                    let code = self.bytes[self.pos + 8..self.pos + 8 + code_len].to_vec();
                    found = Some((code, max_stack, max_locals));
                }
                self.pos = attr_start + len;
            }
            if let Some(result) = found {
                return result;
            }
        }
        panic!("method `{name}` not found (or has no Code attribute)");
    }
}
