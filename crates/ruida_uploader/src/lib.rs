//! Uploads an already-encoded Ruida job stream to a controller over UDP,
//! in MTU-sized, checksummed, acknowledged chunks.
//!
//! Grounded in `udpsendruida.py`'s socket shape (bind a source port,
//! `connect()` to the controller's destination port) with the chunking,
//! checksum, and ACK/NACK retry protocol filled in from the documented
//! wire behavior, since the reference script itself sends the whole
//! buffer in one `sendto()` and does not model retries.

pub mod config;
pub mod error;

use std::net::UdpSocket;
use std::time::Duration;

pub use config::UploadConfig;
pub use error::UploadError;

const ACK_BYTE: u8 = 0xc6;
const NACK_BYTE: u8 = 0x46;

/// Send `data` to the controller described by `config`, split into
/// `config.mtu`-sized chunks each prefixed with a 2-byte big-endian
/// sum-mod-65536 checksum. Waits for a one-byte ACK/NACK reply per chunk.
///
/// Only the first chunk is retried on NACK or timeout, with truncated
/// binary exponential backoff from `backoff_initial_ms` up to
/// `backoff_max_ms`; a NACK on any later chunk is a hard failure, since a
/// transfer that far along is assumed to have wedged the controller into
/// a state a client-side retry cannot recover.
pub fn upload(config: &UploadConfig, data: &[u8]) -> Result<(), UploadError> {
	let socket = UdpSocket::bind(("0.0.0.0", config.source_port))?;
	socket.connect((config.dest_addr, config.dest_port))?;
	socket.set_read_timeout(Some(config.network_timeout()))?;

	log::info!("uploading {} bytes to {}:{} in chunks of {}", data.len(), config.dest_addr, config.dest_port, config.mtu);

	let chunks: Vec<&[u8]> = data.chunks(config.mtu).collect();
	let total = chunks.len();

	for (index, chunk) in chunks.into_iter().enumerate() {
		if index == 0 {
			send_first_chunk_with_backoff(config, &socket, chunk)?;
		} else {
			send_chunk(config, &socket, chunk, 1)?;
		}
		log::debug!("chunk {}/{} acknowledged", index + 1, total);
	}

	log::info!("upload complete");
	Ok(())
}

fn checksum(chunk: &[u8]) -> u16 {
	let sum: u32 = chunk.iter().map(|&b| b as u32).sum();
	(sum % 65536) as u16
}

fn framed_chunk(chunk: &[u8]) -> Vec<u8> {
	let mut framed = Vec::with_capacity(chunk.len() + 2);
	framed.extend_from_slice(&checksum(chunk).to_be_bytes());
	framed.extend_from_slice(chunk);
	framed
}

/// Send one chunk and wait for its reply, without retrying.
fn send_chunk(config: &UploadConfig, socket: &UdpSocket, chunk: &[u8], attempt: u32) -> Result<(), UploadError> {
	let framed = framed_chunk(chunk);
	socket.send(&framed)?;

	let mut reply = [0u8; 1];
	let n = match socket.recv(&mut reply) {
		Ok(n) => n,
		Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
			return Err(UploadError::Timeout);
		}
		Err(e) => return Err(e.into()),
	};

	if n == 0 {
		return Err(UploadError::Timeout);
	}

	match reply[0] {
		ACK_BYTE => Ok(()),
		NACK_BYTE => Err(UploadError::ChecksumRejected { attempts: attempt }),
		other => Err(UploadError::UnexpectedReply(other)),
	}
}

/// Send the first chunk, retrying on NACK or timeout with truncated binary
/// exponential backoff. The controller's UART link is most often still
/// waking up at the very start of a transfer, which is why only this
/// chunk gets a retry budget.
fn send_first_chunk_with_backoff(config: &UploadConfig, socket: &UdpSocket, chunk: &[u8]) -> Result<(), UploadError> {
	let mut delay_ms = config.backoff_initial_ms;
	let mut attempt = 1;
	let mut reached_cap = false;

	loop {
		match send_chunk(config, socket, chunk, attempt) {
			Ok(()) => return Ok(()),
			Err(UploadError::ChecksumRejected { .. } | UploadError::Timeout) if !reached_cap => {
				log::warn!("first chunk rejected or timed out (attempt {attempt}), retrying in {delay_ms}ms");
				std::thread::sleep(Duration::from_millis(delay_ms));
				attempt += 1;
				if delay_ms >= config.backoff_max_ms {
					reached_cap = true;
				}
				delay_ms = (delay_ms * 2).min(config.backoff_max_ms);
			}
			Err(UploadError::ChecksumRejected { .. } | UploadError::Timeout) => {
				return Err(UploadError::ChecksumRejected { attempts: attempt });
			}
			Err(e) => return Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{IpAddr, Ipv4Addr};
	use std::sync::mpsc;

	fn loopback_config(dest_port: u16, source_port: u16) -> UploadConfig {
		UploadConfig {
			dest_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
			dest_port,
			source_port,
			mtu: 8,
			network_timeout_ms: 500,
			backoff_initial_ms: 20,
			backoff_max_ms: 80,
		}
	}

	#[test]
	fn checksum_is_sum_mod_65536() {
		let chunk = [0xffu8; 512];
		let want = (0xffu32 * 512 % 65536) as u16;
		assert_eq!(checksum(&chunk), want);
	}

	#[test]
	fn framed_chunk_prefixes_big_endian_checksum() {
		let chunk = [1u8, 2, 3];
		let framed = framed_chunk(&chunk);
		assert_eq!(&framed[..2], &checksum(&chunk).to_be_bytes());
		assert_eq!(&framed[2..], &chunk);
	}

	#[test]
	fn full_transfer_succeeds_when_every_chunk_is_acked() {
		let dest_port = 52200;
		let source_port = 52201;
		let cfg = loopback_config(dest_port, source_port);

		let server = UdpSocket::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), dest_port)).unwrap();
		server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

		let (tx, rx) = mpsc::channel();
		let server_thread = std::thread::spawn(move || {
			let mut received = Vec::new();
			let mut buf = [0u8; 64];
			loop {
				match server.recv_from(&mut buf) {
					Ok((n, from)) => {
						received.push(buf[..n].to_vec());
						server.send_to(&[ACK_BYTE], from).unwrap();
						if received.len() == 3 {
							break;
						}
					}
					Err(_) => break,
				}
			}
			tx.send(received).unwrap();
		});

		let data = (0u8..20).collect::<Vec<u8>>();
		upload(&cfg, &data).unwrap();

		let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
		server_thread.join().unwrap();

		assert_eq!(received.len(), 3);
		assert_eq!(&received[0][2..], &data[0..8]);
		assert_eq!(&received[1][2..], &data[8..16]);
		assert_eq!(&received[2][2..], &data[16..20]);
	}

	#[test]
	fn first_chunk_nack_then_retry_succeeds() {
		let dest_port = 52220;
		let source_port = 52221;
		let cfg = loopback_config(dest_port, source_port);

		let server = UdpSocket::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), dest_port)).unwrap();
		server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

		let (tx, rx) = mpsc::channel();
		let server_thread = std::thread::spawn(move || {
			let mut received = Vec::new();
			let mut buf = [0u8; 64];
			loop {
				let (n, from) = match server.recv_from(&mut buf) {
					Ok(v) => v,
					Err(_) => break,
				};
				received.push(buf[..n].to_vec());
				if received.len() == 1 {
					server.send_to(&[NACK_BYTE], from).unwrap();
				} else {
					server.send_to(&[ACK_BYTE], from).unwrap();
				}
				if received.len() == 4 {
					break;
				}
			}
			tx.send(received).unwrap();
		});

		let data = (0u8..20).collect::<Vec<u8>>();
		upload(&cfg, &data).unwrap();

		let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
		server_thread.join().unwrap();

		// Chunk 1 is sent twice (NACKed, then retried and ACKed); chunks 2 and 3 once each.
		assert_eq!(received.len(), 4);
		assert_eq!(&received[0][2..], &data[0..8]);
		assert_eq!(&received[1][2..], &data[0..8], "the retried chunk 1 should carry the same payload");
		assert_eq!(&received[2][2..], &data[8..16]);
		assert_eq!(&received[3][2..], &data[16..20]);
	}

	#[test]
	fn non_first_chunk_nack_is_a_hard_failure() {
		let dest_port = 52210;
		let source_port = 52211;
		let cfg = loopback_config(dest_port, source_port);

		let server = UdpSocket::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), dest_port)).unwrap();
		server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

		let server_thread = std::thread::spawn(move || {
			let mut buf = [0u8; 64];
			let mut count = 0;
			loop {
				let (_, from) = match server.recv_from(&mut buf) {
					Ok(v) => v,
					Err(_) => break,
				};
				count += 1;
				if count == 1 {
					server.send_to(&[ACK_BYTE], from).unwrap();
				} else {
					server.send_to(&[NACK_BYTE], from).unwrap();
					break;
				}
			}
		});

		let data = (0u8..20).collect::<Vec<u8>>();
		let result = upload(&cfg, &data);
		server_thread.join().unwrap();

		assert!(matches!(result, Err(UploadError::ChecksumRejected { attempts: 1 })));
	}
}
