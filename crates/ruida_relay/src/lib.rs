//! A single-client UDP relay sitting between a Ruida laser controller and
//! exactly one external client, enforcing session exclusivity and
//! inactivity timeouts over a connectionless transport.
//!
//! Grounded in `RuidaProxy.py`: two UDP sockets (frontend, client-facing;
//! backend, controller-facing), a `select()`-style multiplex loop, and a
//! single active-client IP tracked across datagrams. The blocking
//! multi-socket wait is reimplemented here as alternating short-timeout
//! reads on both sockets (see [`run`]), since the standard library has no
//! portable equivalent to `select()` and the corpus otherwise depends on no
//! async runtime for this kind of synchronous tool.

pub mod config;
pub mod error;

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

pub use config::RelayConfig;
pub use error::RelayError;

const CHUNK_SZ: usize = 4096;
const ACK_BYTE: u8 = 0xc6;
const NACK_BYTE: u8 = 0x46;
/// The scrambled form of a minimal `checksum + 0xD7` trailer packet —
/// the relay watches for this exact payload to anticipate session end.
const FIN_RAW: [u8; 3] = [0x00, 0x60, 0x60];

/// Interval between polls of each socket while waiting for traffic. Short
/// relative to `busy_timeout_secs` so elapsed wall-clock time is tracked
/// accurately without a portable blocking multi-socket wait.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Relay session state. Four explicit states instead of the scattered
/// booleans of the original script.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Session {
	/// No client is currently claiming the session.
	Idle,
	/// `ip` owns the session; `last_seen` is reset on every datagram from
	/// either direction.
	Active { ip: IpAddr, last_seen: Instant },
	/// `ip`'s client sent FIN-RAW; the next backend datagram ends the
	/// session (gives the controller a chance to reply first).
	Ending { ip: IpAddr, last_seen: Instant },
	/// Transient: the session just ended this tick. Collapses to `Idle`
	/// on the next loop iteration; exists only so the "session ended" log
	/// line is emitted exactly once per session.
	Cooling,
}

/// Run the relay until `shutdown` is observed or a socket operation fails
/// unrecoverably. `shutdown` is polled once per loop iteration (roughly
/// every [`POLL_INTERVAL`]); set it from a signal handler or test harness
/// to stop the loop cleanly.
pub fn run(config: &RelayConfig, shutdown: &(impl Fn() -> bool + ?Sized)) -> Result<(), RelayError> {
	let frontend = UdpSocket::bind(SocketAddr::new(config.listen_addr, config.frontend_port))?;
	let backend = UdpSocket::bind(SocketAddr::new(config.listen_addr, config.backend_port))?;
	frontend.set_read_timeout(Some(POLL_INTERVAL))?;
	backend.set_read_timeout(Some(POLL_INTERVAL))?;

	log::info!(
		"relay listening on {}:{{{},{}}}, controller at {}",
		config.listen_addr,
		config.backend_port,
		config.frontend_port,
		config.controller_addr,
	);

	let busy_timeout = Duration::from_secs_f64(config.busy_timeout_secs.max(0.0));
	let mut session = Session::Idle;
	let mut buf = [0u8; CHUNK_SZ];

	while !shutdown() {
		if let Session::Cooling = session {
			session = Session::Idle;
		}

		// Backend first: deliver controller replies promptly.
		match backend.recv_from(&mut buf) {
			Ok((n, from)) => {
				handle_backend_datagram(config, &frontend, &backend, &mut session, &buf[..n], from)?;
				continue;
			}
			Err(e) if is_timeout(&e) => {}
			Err(e) => return Err(e.into()),
		}

		match frontend.recv_from(&mut buf) {
			Ok((n, from)) => {
				handle_frontend_datagram(config, &frontend, &backend, &mut session, busy_timeout, &buf[..n], from)?;
				continue;
			}
			Err(e) if is_timeout(&e) => {}
			Err(e) => return Err(e.into()),
		}

		check_timeout(&mut session, busy_timeout);
	}

	Ok(())
}

fn is_timeout(e: &std::io::Error) -> bool {
	matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn check_timeout(session: &mut Session, busy_timeout: Duration) {
	let last_seen = match *session {
		Session::Active { last_seen, .. } | Session::Ending { last_seen, .. } => Some(last_seen),
		Session::Idle | Session::Cooling => None,
	};
	if let Some(last_seen) = last_seen {
		if last_seen.elapsed() >= busy_timeout {
			log::warn!("session timed out after {:.1}s of inactivity", busy_timeout.as_secs_f64());
			*session = Session::Cooling;
		}
	}
}

fn handle_frontend_datagram(
	config: &RelayConfig,
	frontend: &UdpSocket,
	backend: &UdpSocket,
	session: &mut Session,
	busy_timeout: Duration,
	data: &[u8],
	from: SocketAddr,
) -> Result<(), RelayError> {
	let from_ip = from.ip();
	let now = Instant::now();

	// A long-idle session is logically already gone, even if we have not
	// yet ticked over via check_timeout.
	if let Session::Active { last_seen, .. } | Session::Ending { last_seen, .. } = *session {
		if last_seen.elapsed() >= busy_timeout {
			*session = Session::Idle;
		}
	}

	let active_ip = match *session {
		Session::Idle | Session::Cooling => {
			log::info!("session claimed by {from_ip}");
			*session = Session::Active { ip: from_ip, last_seen: now };
			from_ip
		}
		Session::Active { ip, .. } | Session::Ending { ip, .. } => ip,
	};

	if from_ip != active_ip {
		log::warn!("NACK to stray frontend sender {from_ip}, session owned by {active_ip}");
		frontend.send_to(&[NACK_BYTE], from)?;
		return Ok(());
	}

	backend.send_to(data, SocketAddr::new(config.controller_addr, config.frontend_port))?;

	if data == FIN_RAW {
		log::debug!("FIN-RAW observed from {from_ip}, awaiting controller's final reply");
		*session = Session::Ending { ip: active_ip, last_seen: now };
	} else {
		*session = Session::Active { ip: active_ip, last_seen: now };
	}
	Ok(())
}

fn handle_backend_datagram(
	config: &RelayConfig,
	frontend: &UdpSocket,
	backend: &UdpSocket,
	session: &mut Session,
	data: &[u8],
	from: SocketAddr,
) -> Result<(), RelayError> {
	if from.ip() != config.controller_addr {
		log::warn!("NACK to unknown backend sender {}, expected controller {}", from.ip(), config.controller_addr);
		backend.send_to(&[NACK_BYTE], from)?;
		return Ok(());
	}

	let (client_ip, was_ending) = match *session {
		Session::Active { ip, .. } => (Some(ip), false),
		Session::Ending { ip, .. } => (Some(ip), true),
		Session::Idle | Session::Cooling => (None, false),
	};

	let Some(client_ip) = client_ip else {
		log::warn!("controller reply with no active client, dropping");
		return Ok(());
	};

	frontend.send_to(data, SocketAddr::new(client_ip, config.backend_port))?;

	if was_ending {
		log::info!("session with {client_ip} ended");
		*session = Session::Cooling;
	}
	// `last_seen` is deliberately left untouched here: inactivity is judged
	// solely by client traffic, matching the grounding source, where only
	// the frontend branch ever updates the timestamp a chatty controller
	// could otherwise use to keep a session alive with no client present.
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;
	use std::sync::atomic::{AtomicBool, Ordering};
	use std::sync::Arc;

	fn loopback_config(frontend_port: u16, backend_port: u16, controller: Ipv4Addr) -> RelayConfig {
		RelayConfig {
			listen_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
			controller_addr: IpAddr::V4(controller),
			frontend_port,
			backend_port,
			busy_timeout_secs: 0.3,
		}
	}

	#[test]
	fn stray_frontend_sender_is_nacked_not_forwarded() {
		let frontend_port = 52100;
		let backend_port = 52101;
		let cfg = loopback_config(frontend_port, backend_port, Ipv4Addr::new(127, 0, 0, 2));

		let stop = Arc::new(AtomicBool::new(false));
		let stop_relay = Arc::clone(&stop);
		let handle = std::thread::spawn(move || run(&cfg, &move || stop_relay.load(Ordering::Relaxed)));

		std::thread::sleep(Duration::from_millis(50));

		let client_a = UdpSocket::bind("127.0.0.1:0").unwrap();
		client_a.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
		client_a.send_to(b"hello", (IpAddr::V4(Ipv4Addr::LOCALHOST), frontend_port)).unwrap();
		std::thread::sleep(Duration::from_millis(50));

		// A distinct loopback address stands in for a second remote host.
		let client_b = UdpSocket::bind("127.0.0.3:0").unwrap();
		client_b.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
		client_b.send_to(b"intrude", (IpAddr::V4(Ipv4Addr::LOCALHOST), frontend_port)).unwrap();

		let mut buf = [0u8; 16];
		let (n, _) = client_b.recv_from(&mut buf).expect("B should receive a NACK");
		assert_eq!(&buf[..n], &[NACK_BYTE]);

		stop.store(true, Ordering::Relaxed);
		handle.join().unwrap().unwrap();
	}

	#[test]
	fn session_ends_after_busy_timeout_and_a_new_client_can_claim_it() {
		let frontend_port = 52120;
		let backend_port = 52121;
		let controller = Ipv4Addr::new(127, 0, 0, 5);
		let mut cfg = loopback_config(frontend_port, backend_port, controller);
		cfg.busy_timeout_secs = 0.2;

		// Stands in for the controller: bound where the relay forwards
		// client datagrams (`controller_addr`, reusing `frontend_port` as
		// the target port per the relay's own port-reuse convention).
		let controller_sock = UdpSocket::bind((IpAddr::V4(controller), frontend_port)).unwrap();
		controller_sock.set_read_timeout(Some(Duration::from_millis(500))).unwrap();

		let stop = Arc::new(AtomicBool::new(false));
		let stop_relay = Arc::clone(&stop);
		let handle = std::thread::spawn(move || run(&cfg, &move || stop_relay.load(Ordering::Relaxed)));

		std::thread::sleep(Duration::from_millis(50));

		let client_a = UdpSocket::bind("127.0.0.1:0").unwrap();
		client_a.send_to(b"hello", (IpAddr::V4(Ipv4Addr::LOCALHOST), frontend_port)).unwrap();

		let mut buf = [0u8; 16];
		let (n, _) = controller_sock.recv_from(&mut buf).expect("controller should see A's datagram");
		assert_eq!(&buf[..n], b"hello");

		// Let the session age past busy_timeout_secs with no further traffic.
		std::thread::sleep(Duration::from_millis(500));

		// A distinct loopback address stands in for a second remote host.
		let client_b = UdpSocket::bind("127.0.0.3:0").unwrap();
		client_b.send_to(b"world", (IpAddr::V4(Ipv4Addr::LOCALHOST), frontend_port)).unwrap();

		let (n, _) =
			controller_sock.recv_from(&mut buf).expect("controller should see B's datagram: B claimed a fresh session");
		assert_eq!(&buf[..n], b"world");

		stop.store(true, Ordering::Relaxed);
		handle.join().unwrap().unwrap();
	}
}
