use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use super::config::RconConfig;
use super::packet::*;
use super::{parse_player_count, ActivityError, ActivityOracle};

type Pending = Arc<Mutex<HashMap<i32, oneshot::Sender<Packet>>>>;

struct Session {
    writer: OwnedWriteHalf,
    pending: Pending,
    alive: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl Session {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Player count over the Minecraft RCON protocol.
///
/// Replies are routed by request id: every request registers a oneshot
/// sender that the background reader completes.
pub struct RconOracle {
    config: RconConfig,
    session: Mutex<Option<Session>>,
    next_id: AtomicI32,
}

impl RconOracle {
    pub fn new(config: &RconConfig) -> Self {
        Self {
            config: config.clone(),
            session: Mutex::new(None),
            next_id: AtomicI32::new(1),
        }
    }

    fn next_id(&self) -> i32 {
        // -1 is reserved for auth failures
        self.next_id.fetch_add(1, Ordering::Relaxed) & i32::MAX
    }

    async fn open(&self) -> Result<Session, ActivityError> {
        let stream = TcpStream::connect(self.config.address()).await?;
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = BytesMut::with_capacity(4096);

        let id = self.next_id();
        write_packet(&mut writer, &Packet::new(id, SERVERDATA_AUTH, self.config.password())).await?;

        loop {
            let packet = read_packet(&mut reader, &mut buf).await?;
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            if packet.id == -1 {
                return Err(ActivityError::AuthFailed);
            }
            if packet.id == id {
                break;
            }
        }

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(dispatch(reader, buf, pending.clone(), alive.clone()));

        Ok(Session { writer, pending, alive, reader })
    }

    async fn command(&self, command: &str) -> Result<String, ActivityError> {
        let id = self.next_id();
        let (reply_tx, reply_rx) = oneshot::channel();

        let pending = {
            let mut session = self.session.lock().await;
            let session = match session.as_mut() {
                Some(s) if s.is_alive() => s,
                _ => return Err(ActivityError::NotConnected),
            };

            session.pending.lock().await.insert(id, reply_tx);
            if let Err(e) = write_packet(&mut session.writer, &Packet::new(id, SERVERDATA_EXECCOMMAND, command)).await {
                session.pending.lock().await.remove(&id);
                return Err(e);
            }
            session.pending.clone()
        };

        match timeout(self.config.timeout(), reply_rx).await {
            Ok(Ok(packet)) => Ok(packet.body),
            Ok(Err(_)) => Err(ActivityError::Disconnected),
            Err(_) => {
                pending.lock().await.remove(&id);
                Err(ActivityError::Timeout)
            }
        }
    }
}

#[async_trait]
impl ActivityOracle for RconOracle {
    async fn connect(&self) -> Result<(), ActivityError> {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(Session::is_alive) {
            return Ok(());
        }

        info!("RCON connecting to {}", self.config.address());
        let opened = match timeout(self.config.timeout(), self.open()).await {
            Ok(opened) => opened?,
            Err(_) => return Err(ActivityError::Timeout),
        };
        if let Some(stale) = session.replace(opened) {
            stale.reader.abort();
        }
        info!("RCON authenticated");

        Ok(())
    }

    async fn wait_until_connected(&self) -> Result<(), ActivityError> {
        loop {
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_connection_error() => {
                    warn!("{}, retrying in {}s", e, self.config.retry_delay().as_secs());
                    sleep(self.config.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn active_count(&self) -> Result<u32, ActivityError> {
        let reply = self.command("list").await?;
        let (online, max) = parse_player_count(&reply)?;
        debug!("Player count: {}/{}", online, max);
        Ok(online)
    }

    async fn disconnect(&self) -> Result<(), ActivityError> {
        let session = self.session.lock().await.take();
        if let Some(mut session) = session {
            session.reader.abort();
            if let Err(e) = session.writer.shutdown().await {
                debug!("RCON shutdown: {}", e);
            }
            info!("RCON disconnected");
        }
        Ok(())
    }
}

async fn dispatch(mut reader: OwnedReadHalf, mut buf: BytesMut, pending: Pending, alive: Arc<AtomicBool>) {
    loop {
        match read_packet(&mut reader, &mut buf).await {
            Ok(packet) => match pending.lock().await.remove(&packet.id) {
                Some(reply_tx) => {
                    let _ = reply_tx.send(packet);
                }
                None => debug!("Dropping unsolicited RCON packet {}", packet.id),
            },
            Err(e) => {
                debug!("RCON reader ended: {}", e);
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
    // dropping the senders fails every outstanding request
    pending.lock().await.clear();
}

async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut BytesMut) -> Result<Packet, ActivityError> {
    loop {
        if let Some(packet) = Packet::decode(buf)? {
            return Ok(packet);
        }
        if reader.read_buf(buf).await? == 0 {
            return Err(ActivityError::Disconnected);
        }
    }
}

async fn write_packet<W: AsyncWrite + Unpin>(writer: &mut W, packet: &Packet) -> Result<(), ActivityError> {
    let mut buf = BytesMut::new();
    packet.encode(&mut buf);
    writer.write_all(&buf).await?;
    Ok(())
}
