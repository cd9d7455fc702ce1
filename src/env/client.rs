use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::info;

use crate::env::protocol::{read_frame, write_frame, Request, Response};
use crate::env::service::{GameService, MoveResponse};
use crate::error::EnvError;
use crate::game::ActionKind;

/// Connection settings for the game service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub connect_timeout_ms: u64,
    /// Read/write timeout per request. 0 waits forever.
    pub io_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "127.0.0.1:50051".into(),
            connect_timeout_ms: 5_000,
            io_timeout_ms: 30_000,
        }
    }
}

/// Blocking client for the game service, one request in flight at a time.
pub struct TcpGameClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl TcpGameClient {
    pub fn connect(config: &ServerConfig) -> Result<Self, EnvError> {
        let connect_err = |source: std::io::Error| EnvError::Connect {
            addr: config.address.clone(),
            source,
        };
        let addr = config
            .address
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "address resolved to nothing",
                ))
            })?;
        let stream =
            TcpStream::connect_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))
                .map_err(connect_err)?;

        let io_timeout = (config.io_timeout_ms > 0).then(|| Duration::from_millis(config.io_timeout_ms));
        stream.set_read_timeout(io_timeout)?;
        stream.set_write_timeout(io_timeout)?;
        stream.set_nodelay(true)?;

        info!(address = %config.address, "connected to game service");
        Ok(TcpGameClient {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    fn round_trip(&mut self, request: &Request) -> Result<Response, EnvError> {
        write_frame(&mut self.writer, request)?;
        match read_frame(&mut self.reader)? {
            Response::Error { message } => Err(EnvError::Service(message)),
            other => Ok(other),
        }
    }
}

impl GameService for TcpGameClient {
    fn make_move(&mut self, x: usize, y: usize, kind: ActionKind) -> Result<MoveResponse, EnvError> {
        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| EnvError::Protocol(format!("coordinate {v} too large")))
        };
        let request = Request::MakeMove {
            x: to_u32(x)?,
            y: to_u32(y)?,
            action: kind.index() as u32,
        };
        match self.round_trip(&request)? {
            Response::Moved(resp) => Ok(resp),
            other => Err(EnvError::Protocol(format!(
                "expected move result, got {other:?}"
            ))),
        }
    }

    fn reset(&mut self) -> Result<Vec<Vec<f32>>, EnvError> {
        match self.round_trip(&Request::Reset)? {
            Response::Board { board } => Ok(board),
            other => Err(EnvError::Protocol(format!("expected board, got {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Serve `replies` in order, one per request, and return the requests seen.
    fn fake_server(replies: Vec<Response>) -> (ServerConfig, thread::JoinHandle<Vec<Request>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut seen = Vec::new();
            for reply in replies {
                let req: Request = read_frame(&mut reader).unwrap();
                seen.push(req);
                write_frame(&mut writer, &reply).unwrap();
            }
            seen
        });
        let config = ServerConfig {
            address,
            ..Default::default()
        };
        (config, handle)
    }

    #[test]
    fn test_reset_and_move_round_trip() {
        let board = vec![vec![-1.0, -1.0], vec![-1.0, 1.0]];
        let (config, server) = fake_server(vec![
            Response::Board {
                board: board.clone(),
            },
            Response::Moved(MoveResponse {
                board: board.clone(),
                reward: -1.0,
                state: 2,
            }),
        ]);

        let mut client = TcpGameClient::connect(&config).unwrap();
        assert_eq!(client.reset().unwrap(), board);
        let resp = client.make_move(1, 0, ActionKind::Flag).unwrap();
        assert_eq!(resp.state, 2);
        assert_eq!(resp.reward, -1.0);

        let seen = server.join().unwrap();
        assert_eq!(
            seen,
            vec![
                Request::Reset,
                Request::MakeMove { x: 1, y: 0, action: 1 }
            ]
        );
    }

    #[test]
    fn test_service_error_is_surfaced() {
        let (config, server) = fake_server(vec![Response::Error {
            message: "invalid action: 7".into(),
        }]);
        let mut client = TcpGameClient::connect(&config).unwrap();
        let err = client.make_move(0, 0, ActionKind::Reveal).unwrap_err();
        assert!(matches!(err, EnvError::Service(ref m) if m == "invalid action: 7"));
        server.join().unwrap();
    }

    #[test]
    fn test_unexpected_reply_is_protocol_error() {
        let (config, server) = fake_server(vec![Response::Board { board: vec![] }]);
        let mut client = TcpGameClient::connect(&config).unwrap();
        let err = client.make_move(0, 0, ActionKind::Reveal).unwrap_err();
        assert!(matches!(err, EnvError::Protocol(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let config = ServerConfig {
            address,
            connect_timeout_ms: 500,
            ..Default::default()
        };
        assert!(matches!(
            TcpGameClient::connect(&config),
            Err(EnvError::Connect { .. })
        ));
    }
}
