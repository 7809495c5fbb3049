//! Minimal FTP client on tokio sockets.
//!
//! Covers exactly what the uploader needs: optional login, `DELE`, binary
//! `STOR` and `LIST` over either an active (`PORT`/`EPRT`) or passive
//! (`PASV`) data connection.

use super::retry::{UploadJob, Uploader};
use crate::config::UploadSettings;
use crate::error::UploadError;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// A parsed server reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    fn is(&self, codes: &[u16]) -> bool {
        codes.contains(&self.code)
    }
}

/// An open control connection
pub struct FtpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    local_ip: IpAddr,
    peer_ip: IpAddr,
    passive: bool,
}

impl FtpSession {
    /// Connect and consume the server greeting
    pub async fn connect(address: &str, passive: bool) -> Result<Self, UploadError> {
        let stream = TcpStream::connect(address).await?;
        let local_ip = stream.local_addr()?.ip();
        let peer_ip = stream.peer_addr()?.ip();
        let (read_half, writer) = stream.into_split();

        let mut session = Self {
            reader: BufReader::new(read_half),
            writer,
            local_ip,
            peer_ip,
            passive,
        };

        let greeting = session.read_reply().await?;
        expect(&greeting, &[220], "connect")?;
        debug!("Connected to {}: {}", address, greeting.text);
        Ok(session)
    }

    pub async fn login(&mut self, user: &str, password: &str) -> Result<(), UploadError> {
        let reply = self.command(&format!("USER {}", user)).await?;
        if reply.code == 331 {
            let reply = self.command(&format!("PASS {}", password)).await?;
            expect(&reply, &[230, 202], "PASS")?;
        } else {
            expect(&reply, &[230], "USER")?;
        }
        Ok(())
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), UploadError> {
        let reply = self.command(&format!("DELE {}", path)).await?;
        expect(&reply, &[250, 200], "DELE")
    }

    /// Store `data` at `path` in binary mode
    pub async fn store<R>(&mut self, path: &str, data: &mut R) -> Result<u64, UploadError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let reply = self.command("TYPE I").await?;
        expect(&reply, &[200], "TYPE I")?;

        let mut conn = self.open_data(&format!("STOR {}", path)).await?;
        let written = tokio::io::copy(data, &mut conn).await?;
        conn.shutdown().await?;
        drop(conn);

        let done = self.read_reply().await?;
        expect(&done, &[226, 250], "STOR")?;
        debug!("Stored {} bytes at {}", written, path);
        Ok(written)
    }

    /// Directory listing of the current remote directory
    pub async fn list(&mut self) -> Result<Vec<String>, UploadError> {
        let reply = self.command("TYPE A").await?;
        expect(&reply, &[200], "TYPE A")?;

        // Server file names are not guaranteed to be UTF-8
        let mut conn = BufReader::new(self.open_data("LIST").await?);
        let mut listing = Vec::new();
        let mut raw = Vec::new();
        while conn.read_until(b'\n', &mut raw).await? > 0 {
            listing.push(decode_line(&raw));
            raw.clear();
        }
        drop(conn);

        let done = self.read_reply().await?;
        expect(&done, &[226, 250], "LIST")?;
        Ok(listing)
    }

    pub async fn quit(mut self) -> Result<(), UploadError> {
        let reply = self.command("QUIT").await?;
        expect(&reply, &[221], "QUIT")
    }

    async fn command(&mut self, line: &str) -> Result<Reply, UploadError> {
        let shown = if line.starts_with("PASS ") { "PASS ****" } else { line };
        debug!("> {}", shown);
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        self.writer.flush().await?;
        self.read_reply().await
    }

    /// Read one reply, folding multi-line `123-...` / `123 ...` blocks
    async fn read_reply(&mut self) -> Result<Reply, UploadError> {
        let first = self.read_line().await?;
        let (code, separator) = parse_status(&first)?;
        let mut text = first.get(4..).unwrap_or_default().to_string();

        if separator == Some('-') {
            let terminator = format!("{} ", code);
            loop {
                let line = self.read_line().await?;
                text.push('\n');
                if let Some(rest) = line.strip_prefix(&terminator) {
                    text.push_str(rest);
                    break;
                }
                text.push_str(&line);
            }
        }

        debug!("< {} {}", code, text);
        Ok(Reply { code, text })
    }

    async fn read_line(&mut self) -> Result<String, UploadError> {
        let mut raw = Vec::new();
        let n = self.reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            return Err(UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "control connection closed",
            )));
        }
        Ok(decode_line(&raw))
    }

    /// Issue a transfer command and return the connected data stream
    async fn open_data(&mut self, transfer: &str) -> Result<TcpStream, UploadError> {
        if self.passive {
            let reply = self.command("PASV").await?;
            expect(&reply, &[227], "PASV")?;
            let port = parse_pasv_port(&reply.text)?;
            // Connect to the control peer, not the address embedded in the reply
            let conn = TcpStream::connect(SocketAddr::new(self.peer_ip, port)).await?;

            let reply = self.command(transfer).await?;
            expect(&reply, &[125, 150], transfer)?;
            Ok(conn)
        } else {
            let listener = TcpListener::bind(SocketAddr::new(self.local_ip, 0)).await?;
            let port = listener.local_addr()?.port();
            let announce = port_command(self.local_ip, port);
            let reply = self.command(&announce).await?;
            expect(&reply, &[200], &announce)?;

            let reply = self.command(transfer).await?;
            expect(&reply, &[125, 150], transfer)?;
            let (conn, peer) = listener.accept().await?;
            debug!("Data connection from {}", peer);
            Ok(conn)
        }
    }
}

/// Lossy UTF-8 without the line terminator
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

fn expect(reply: &Reply, codes: &[u16], command: &str) -> Result<(), UploadError> {
    if reply.is(codes) {
        Ok(())
    } else {
        Err(UploadError::Protocol {
            command: command.split_whitespace().next().unwrap_or(command).to_string(),
            reply: format!("{} {}", reply.code, reply.text),
        })
    }
}

fn parse_status(line: &str) -> Result<(u16, Option<char>), UploadError> {
    let code = line
        .get(..3)
        .filter(|c| c.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| UploadError::MalformedReply(line.to_string()))?;
    Ok((code, line.chars().nth(3)))
}

/// Port from `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
fn parse_pasv_port(text: &str) -> Result<u16, UploadError> {
    let malformed = || UploadError::MalformedReply(text.to_string());
    let start = text.find('(').ok_or_else(malformed)?;
    let end = text[start..].find(')').ok_or_else(malformed)? + start;

    let fields: Vec<u16> = text[start + 1..end]
        .split(',')
        .map(|f| f.trim().parse::<u8>().map(u16::from))
        .collect::<Result<_, _>>()
        .map_err(|_| malformed())?;

    if fields.len() != 6 {
        return Err(malformed());
    }
    Ok((fields[4] << 8) | fields[5])
}

fn port_command(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            format!(
                "PORT {},{},{},{},{},{}",
                o[0],
                o[1],
                o[2],
                o[3],
                port >> 8,
                port & 0xff
            )
        }
        IpAddr::V6(v6) => format!("EPRT |2|{}|{}|", v6, port),
    }
}

/// `host:port` for the control connection, accepting a port already in `server`
pub fn server_address(server: &str, port: u16) -> String {
    if server.parse::<SocketAddr>().is_ok() {
        return server.to_string();
    }
    match server.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{}]:{}", v6, port),
        Ok(IpAddr::V4(v4)) => format!("{}:{}", v4, port),
        Err(_) if server.contains(':') => server.to_string(),
        Err(_) => format!("{}:{}", server, port),
    }
}

/// Uploads over a fresh FTP session per attempt
pub struct FtpUploader {
    settings: UploadSettings,
}

impl FtpUploader {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    pub fn address(&self) -> String {
        server_address(&self.settings.server, self.settings.port)
    }
}

#[async_trait]
impl Uploader for FtpUploader {
    async fn upload(&self, job: &UploadJob) -> Result<Vec<String>, UploadError> {
        let mut session = FtpSession::connect(&self.address(), self.settings.passive).await?;

        if let Some(user) = &self.settings.user {
            let password = self.settings.password.as_deref().unwrap_or_default();
            session.login(user, password).await?;
        }

        match session.delete(&job.remote_path).await {
            Ok(()) => info!("Deleted existing {}", job.remote_path),
            Err(e) => info!("{} did not exist ({})", job.remote_path, e),
        }

        let mut file = tokio::fs::File::open(&job.source).await?;
        session.store(&job.remote_path, &mut file).await?;

        let listing = session.list().await?;
        session.quit().await?;
        Ok(listing)
    }
}
