//! Shared networking constants and helpers used by client and server.

/// TCP port on which the server accepts inbound alert messages.
pub const INTAKE_PORT: u16 = 8025;

/// Largest intake payload the server will read from one connection.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_joins_host_and_port() {
        assert_eq!(addr("127.0.0.1", INTAKE_PORT), "127.0.0.1:8025");
    }
}
