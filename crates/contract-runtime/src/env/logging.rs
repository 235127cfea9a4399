//! # Logging & Termination

use super::Env;
use crate::errors::{HostResult, Trap};
use crate::ports::outbound::HostApi;
use std::fmt::{self, Write as _};

impl<H: HostApi> Env<'_, H> {
    /// Log every part, separated by single spaces.
    pub fn log(&mut self, parts: &[&dyn fmt::Display]) -> HostResult<()> {
        let mut line = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            // Writing into a String cannot fail
            let _ = write!(line, "{part}");
        }
        self.log_str(&line)
    }

    /// Log a text line.
    pub fn log_str(&mut self, message: &str) -> HostResult<()> {
        self.host.log_utf8(message.as_bytes())
    }

    /// Log raw bytes that must be valid UTF-8.
    pub fn log_utf8(&mut self, message: &[u8]) -> HostResult<()> {
        self.host.log_utf8(message)
    }

    /// Log UTF-16 code units.
    pub fn log_utf16(&mut self, message: &[u16]) -> HostResult<()> {
        let bytes: Vec<u8> = message.iter().flat_map(|unit| unit.to_le_bytes()).collect();
        self.host.log_utf16(&bytes)
    }

    /// Abort with a UTF-8 message. Propagate the returned trap.
    #[must_use]
    pub fn panic_utf8(&mut self, message: &[u8]) -> Trap {
        self.host.panic_utf8(message)
    }

    /// Abort with a text message. Propagate the returned trap.
    #[must_use]
    pub fn panic_str(&mut self, message: &str) -> Trap {
        self.panic_utf8(message.as_bytes())
    }

    /// Abort with `message` unless `condition` holds.
    pub fn require(&mut self, condition: bool, message: &str) -> HostResult<()> {
        if condition {
            Ok(())
        } else {
            Err(self.panic_str(message))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::adapters::InMemoryHost;
    use crate::domain::entities::InvocationContext;
    use crate::env::Env;
    use crate::errors::Trap;
    use crate::ports::outbound::{HostApi, HostLifecycle};

    fn host() -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.begin(InvocationContext::new("log.test", "alice.test"));
        host
    }

    #[test]
    fn test_log_joins_with_spaces() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        env.log(&[&"transfer", &5, &"to", &"bob"]).unwrap();
        env.log(&[]).unwrap();
        let effects = host.commit().unwrap();
        assert_eq!(effects.logs, vec!["transfer 5 to bob".to_string(), String::new()]);
    }

    #[test]
    fn test_log_utf16() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        let units: Vec<u16> = "héllo ✓".encode_utf16().collect();
        env.log_utf16(&units).unwrap();
        assert_eq!(host.commit().unwrap().logs, vec!["héllo ✓".to_string()]);
    }

    #[test]
    fn test_invalid_log_encodings_trap() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        assert!(matches!(env.log_utf8(&[0xff]), Err(Trap::InvalidUtf8 { .. })));
        // Lone surrogate
        assert_eq!(env.log_utf16(&[0xD800]), Err(Trap::InvalidUtf16));
        assert_eq!(env.host().log_utf16(&[0x41]), Err(Trap::InvalidUtf16));
    }

    #[test]
    fn test_panic_and_require() {
        let mut host = host();
        let mut env = Env::new(&mut host);
        assert_eq!(env.require(true, "unused"), Ok(()));
        assert_eq!(
            env.require(false, "not enough funds"),
            Err(Trap::Panic("not enough funds".to_string()))
        );
        assert!(env.panic_str("boom").is_contract_panic());
    }
}
