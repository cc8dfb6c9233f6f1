//! C library queries: session enumeration and interface addresses.

use std::net::IpAddr;

use crate::collector::CollectError;
use crate::model::{InterfaceAddress, Session};
#[cfg(unix)]
use crate::util::netmask_prefix;

/// Lists logged-in users through `getutxent`.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn native_sessions() -> Result<Vec<Session>, CollectError> {
    use std::sync::Mutex;

    use crate::collector::utmp::fixed_text;

    // The utmpx cursor is process-global.
    static UTMPX_LOCK: Mutex<()> = Mutex::new(());

    fn text(buf: &[libc::c_char]) -> String {
        let bytes: Vec<u8> = buf.iter().map(|&c| c as u8).collect();
        fixed_text(&bytes)
    }

    let _guard = UTMPX_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut sessions = Vec::new();

    // SAFETY: setutxent/getutxent/endutxent are called in sequence while
    // holding UTMPX_LOCK. Each returned pointer is either null or points to a
    // static buffer that stays valid until the next getutxent call, and the
    // entry is copied out before that happens.
    unsafe {
        libc::setutxent();
        loop {
            let entry = libc::getutxent();
            if entry.is_null() {
                break;
            }
            let entry = &*entry;
            if entry.ut_type != libc::USER_PROCESS {
                continue;
            }
            let started = entry.ut_tv.tv_sec as i64;
            sessions.push(Session {
                user: text(&entry.ut_user),
                host: text(&entry.ut_host),
                terminal: text(&entry.ut_line),
                started: (started != 0).then_some(started),
            });
        }
        libc::endutxent();
    }

    Ok(sessions)
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn native_sessions() -> Result<Vec<Session>, CollectError> {
    Err(CollectError::Unsupported("getutxent"))
}

/// Converts a socket address to an IP address.
///
/// # Safety
/// `sa` must be null or point to a valid `sockaddr` whose real size matches
/// its `sa_family`.
#[cfg(unix)]
unsafe fn sockaddr_ip(sa: *const libc::sockaddr) -> Option<IpAddr> {
    use std::net::{Ipv4Addr, Ipv6Addr};

    if sa.is_null() {
        return None;
    }
    // SAFETY: non-null and valid per the function contract; the cast matches
    // the family tag.
    unsafe {
        match (*sa).sa_family as libc::c_int {
            libc::AF_INET => {
                let sin = &*(sa as *const libc::sockaddr_in);
                Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
            }
            libc::AF_INET6 => {
                let sin6 = &*(sa as *const libc::sockaddr_in6);
                Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
            }
            _ => None,
        }
    }
}

/// Lists IPv4 and IPv6 addresses of all interfaces through `getifaddrs`.
///
/// Each address is formatted `addr/prefix`.
#[cfg(unix)]
pub fn interface_addresses() -> Result<Vec<InterfaceAddress>, CollectError> {
    use std::ffi::CStr;

    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs writes a list head into `head` on success.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    let mut addresses = Vec::new();
    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: `cursor` walks the list returned by getifaddrs, which stays
        // alive until freeifaddrs below.
        let ifa = unsafe { &*cursor };
        cursor = ifa.ifa_next;

        // SAFETY: address and netmask pointers come from getifaddrs.
        let Some(ip) = (unsafe { sockaddr_ip(ifa.ifa_addr) }) else {
            continue;
        };
        let prefix = unsafe { sockaddr_ip(ifa.ifa_netmask) }
            .map(netmask_prefix)
            .unwrap_or(if ip.is_ipv4() { 32 } else { 128 });
        // SAFETY: ifa_name is a NUL-terminated string owned by the list.
        let name = unsafe { CStr::from_ptr(ifa.ifa_name) }
            .to_string_lossy()
            .into_owned();

        addresses.push(InterfaceAddress {
            name,
            address: format!("{}/{}", ip, prefix),
        });
    }

    // SAFETY: `head` came from a successful getifaddrs and is freed once.
    unsafe { libc::freeifaddrs(head) };
    Ok(addresses)
}

#[cfg(not(unix))]
pub fn interface_addresses() -> Result<Vec<InterfaceAddress>, CollectError> {
    Err(CollectError::Unsupported("getifaddrs"))
}
