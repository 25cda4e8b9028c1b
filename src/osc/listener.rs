//! OSC listener: a UDP socket read on its own thread.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rosc::{decoder, OscPacket};
use tracing::{debug, info};

use super::config::OscConfig;
use super::mapping::apply_osc_message;
use crate::audio::AudioControl;
use crate::engine::SharedEngine;

/// Active OSC listener running on a background thread.
pub struct OscListener {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    port: u16,
}

impl OscListener {
    /// Start listening for OSC messages on a UDP port. Port 0 picks a free
    /// port; see [`port`](Self::port). Volume and mute messages go to
    /// `audio` when there is one.
    pub fn start(
        config: &OscConfig,
        engine: SharedEngine,
        audio: Option<AudioControl>,
    ) -> io::Result<Self> {
        let addr = format!("{}:{}", config.bind_address, config.listen_port);
        let socket = UdpSocket::bind(&addr)?;
        // Short timeout so the stop flag is checked periodically.
        socket.set_read_timeout(Some(Duration::from_millis(100)))?;
        let port = socket.local_addr()?.port();
        info!(port, "OSC listener started");

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let prefix = config.prefix.clone();

        let thread = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while !stop_clone.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((size, _addr)) => match decoder::decode_udp(&buf[..size]) {
                        Ok((_, packet)) => {
                            dispatch(packet, &prefix, &engine, audio.as_ref())
                        }
                        Err(e) => debug!("undecodable OSC packet: {e}"),
                    },
                    Err(ref e)
                        if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        debug!("OSC socket closed: {e}");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            stop_flag,
            thread: Some(thread),
            port,
        })
    }

    /// Get the listening port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Signal the listener to stop and wait for its thread.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch(
    packet: OscPacket,
    prefix: &str,
    engine: &SharedEngine,
    audio: Option<&AudioControl>,
) {
    match packet {
        OscPacket::Message(msg) => apply_osc_message(&msg, prefix, engine, audio),
        OscPacket::Bundle(bundle) => {
            for content in bundle.content {
                dispatch(content, prefix, engine, audio);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use rosc::{encoder, OscMessage, OscType};

    fn config() -> OscConfig {
        OscConfig {
            listen_port: 0,
            ..OscConfig::default()
        }
    }

    fn send(port: u16, packet: &OscPacket) {
        let encoded = encoder::encode(packet).unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.send_to(&encoded, ("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn start_and_stop() {
        let engine = SharedEngine::new(Engine::new(8000));
        let mut listener = OscListener::start(&config(), engine, None).unwrap();
        assert_ne!(listener.port(), 0);
        listener.stop();
    }

    #[test]
    fn set_variable_over_udp() {
        let engine = SharedEngine::new(Engine::new(8000));
        let mut listener = OscListener::start(&config(), engine.clone(), None).unwrap();

        let msg = OscPacket::Message(OscMessage {
            addr: "/glitch/set".to_string(),
            args: vec![OscType::String("gain".into()), OscType::Float(0.75)],
        });
        send(listener.port(), &msg);

        let mut value = None;
        for _ in 0..50 {
            thread::sleep(Duration::from_millis(20));
            value = engine.get("gain");
            if value.is_some() {
                break;
            }
        }
        assert_eq!(value, Some(0.75));
        listener.stop();
    }

    #[test]
    fn bind_failure_on_used_port() {
        let engine = SharedEngine::new(Engine::new(8000));
        let first = OscListener::start(&config(), engine.clone(), None).unwrap();
        let taken = OscConfig {
            listen_port: first.port(),
            ..OscConfig::default()
        };
        assert!(OscListener::start(&taken, engine, None).is_err());
    }
}
