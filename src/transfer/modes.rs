//! FTP Transfer modes
//!
//! Passive/active bookkeeping and the PORT/PASV address encodings.

use crate::error::TransferError;
use std::net::{Ipv4Addr, SocketAddrV4};

/// FTP transfer modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    Active,
    #[default]
    Passive,
}

/// Parses a PORT argument `h1,h2,h3,h4,p1,p2`.
pub fn parse_port_argument(arg: &str) -> Result<SocketAddrV4, TransferError> {
    let invalid = || TransferError::InvalidPortArgument(arg.to_string());

    let fields = arg
        .split(',')
        .map(|field| field.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| invalid())?;

    let [h1, h2, h3, h4, p1, p2] = fields[..] else {
        return Err(invalid());
    };

    let ip = Ipv4Addr::new(h1, h2, h3, h4);
    let port = u16::from(p1) << 8 | u16::from(p2);
    Ok(SocketAddrV4::new(ip, port))
}

/// Encodes an endpoint as the PASV sextet `a,b,c,d,p1,p2`.
pub fn format_pasv_address(addr: &SocketAddrV4) -> String {
    let [a, b, c, d] = addr.ip().octets();
    let port = addr.port();
    format!("{},{},{},{},{},{}", a, b, c, d, port >> 8, port & 255)
}
