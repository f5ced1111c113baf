use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use udara_core::Predictor;
use udara_rpc::{
    decode_request, encode_reply, FrameHeader, PredictReply, HEADER_LEN, OP_PREDICT, STATUS_INTERNAL,
    STATUS_INVALID_INPUT,
};

/// Counters behind the PULSE log line. Reset on every pulse.
#[derive(Default)]
pub struct ServiceStats {
    requests: AtomicU64,
    rows: AtomicU64,
    rejected: AtomicU64,
}

impl ServiceStats {
    pub fn take(&self) -> (u64, u64, u64) {
        (
            self.requests.swap(0, Ordering::Relaxed),
            self.rows.swap(0, Ordering::Relaxed),
            self.rejected.swap(0, Ordering::Relaxed),
        )
    }
}

/// Serves predictions over UBP frames.
///
/// # Thread Safety
/// The predictor is immutable and shared through an `Arc`; connections never
/// take a lock.
pub struct PredictionService {
    predictor: Arc<Predictor>,
    stats: Arc<ServiceStats>,
    max_rows: usize,
}

impl PredictionService {
    pub fn new(predictor: Arc<Predictor>, max_rows: usize) -> Self {
        Self {
            predictor,
            stats: Arc::new(ServiceStats::default()),
            max_rows,
        }
    }

    pub fn stats(&self) -> Arc<ServiceStats> {
        self.stats.clone()
    }

    /// Turns one request payload into its reply. Never panics on client input.
    pub fn handle_payload(&self, payload: &[u8]) -> PredictReply {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let request = match decode_request(payload) {
            Ok(r) => r,
            Err(e) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                return PredictReply::failure(STATUS_INVALID_INPUT, e.to_string());
            }
        };

        if request.readings.len() > self.max_rows {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return PredictReply::failure(
                STATUS_INVALID_INPUT,
                format!("batch of {} rows exceeds limit of {}", request.readings.len(), self.max_rows),
            );
        }

        self.stats.rows.fetch_add(request.readings.len() as u64, Ordering::Relaxed);
        let labels = self.predictor.predict_all(&request.readings);
        PredictReply::ok(labels.into_iter().map(|c| c.label()).collect())
    }

    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        info!("Prediction service listening on {}", listener.local_addr()?);
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("Accepted client {}", peer);
            let svc = self.clone();
            tokio::spawn(async move {
                if let Err(e) = svc.handle_connection(stream, peer).await {
                    warn!("Client {} dropped: {}", peer, e);
                }
            });
        }
    }

    async fn handle_connection(self: Arc<Self>, mut stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        stream.set_nodelay(true)?;
        let mut header_buf = [0u8; HEADER_LEN];

        loop {
            match stream.read_exact(&mut header_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!("Client {} closed the connection", peer);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            // A bad header means framing is lost; nothing after it can be trusted.
            let header = match FrameHeader::from_bytes(&header_buf) {
                Ok(h) => h,
                Err(e) => {
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    error!("Client {} sent an invalid frame: {}", peer, e);
                    return Ok(());
                }
            };

            let mut payload = vec![0u8; header.payload_len as usize];
            stream.read_exact(&mut payload).await?;

            let reply = if header.opcode != OP_PREDICT {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                PredictReply::failure(STATUS_INVALID_INPUT, format!("unknown opcode {}", header.opcode))
            } else {
                let svc = self.clone();
                match tokio::task::spawn_blocking(move || svc.handle_payload(&payload)).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!("Prediction task for request {} failed: {}", header.request_id, e);
                        PredictReply::failure(STATUS_INTERNAL, "prediction failed")
                    }
                }
            };

            let frame = encode_reply(header.request_id, &reply)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            stream.write_all(&frame).await?;
        }
    }
}

/// Logs `PULSE | requests=.. rows=.. rejected=..` once per interval.
pub fn spawn_pulse(stats: Arc<ServiceStats>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (requests, rows, rejected) = stats.take();
            if requests > 0 || rejected > 0 {
                info!("PULSE | requests={} rows={} rejected={}", requests, rows, rejected);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use udara_core::{Category, InMemorySource, ModelConfig};
    use udara_rpc::{decode_reply, encode_request, PredictRequest, STATUS_OK};

    fn service(max_rows: usize) -> Arc<PredictionService> {
        let source = InMemorySource {
            x: vec![vec![0.0; 6], vec![1.0; 6]],
            y: vec![0.0, 3.0],
        };
        let predictor = Predictor::from_source(ModelConfig::default(), &source).unwrap();
        Arc::new(PredictionService::new(Arc::new(predictor), max_rows))
    }

    fn payload(readings: Vec<[f64; 6]>) -> Vec<u8> {
        encode_request(1, &PredictRequest { readings }).unwrap()[HEADER_LEN..].to_vec()
    }

    #[test]
    fn test_payload_predicts_in_order() {
        let svc = service(10);
        let bounds = ModelConfig::default().bounds;
        let reply = svc.handle_payload(&payload(vec![bounds.max, bounds.min, bounds.max]));
        assert_eq!(reply.status, STATUS_OK);
        assert_eq!(
            reply.labels,
            vec![Category::VeryUnhealthy.label(), Category::Good.label(), Category::VeryUnhealthy.label()]
        );
        assert_eq!(svc.stats().take(), (1, 3, 0));
    }

    #[test]
    fn test_oversize_batch_rejected() {
        let svc = service(1);
        let reply = svc.handle_payload(&payload(vec![[0.0; 6]; 2]));
        assert_eq!(reply.status, STATUS_INVALID_INPUT);
        assert!(reply.labels.is_empty());
        assert_eq!(svc.stats().take(), (1, 0, 1));
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let svc = service(10);
        let reply = svc.handle_payload(&[1, 2, 3]);
        assert_eq!(reply.status, STATUS_INVALID_INPUT);
    }

    async fn start(svc: Arc<PredictionService>) -> TcpStream {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(svc.serve(listener));
        TcpStream::connect(addr).await.unwrap()
    }

    async fn read_reply(client: &mut TcpStream) -> (FrameHeader, PredictReply) {
        let mut header = [0u8; HEADER_LEN];
        client.read_exact(&mut header).await.unwrap();
        let header = FrameHeader::from_bytes(&header).unwrap();
        let mut body = vec![0u8; header.payload_len as usize];
        client.read_exact(&mut body).await.unwrap();
        (header, decode_reply(&body).unwrap())
    }

    fn raw_frame(opcode: u8, request_id: u64, body: &[u8]) -> Vec<u8> {
        let mut frame = FrameHeader::new(opcode, body.len() as u32, request_id).to_bytes().to_vec();
        frame.extend_from_slice(body);
        frame
    }

    fn max_reading_frame(request_id: u64) -> Vec<u8> {
        let readings = vec![ModelConfig::default().bounds.max];
        encode_request(request_id, &PredictRequest { readings }).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_over_tcp() {
        let mut client = start(service(10)).await;
        let frame = encode_request(99, &PredictRequest { readings: vec![ModelConfig::default().bounds.min] }).unwrap();
        client.write_all(&frame).await.unwrap();

        let (header, reply) = read_reply(&mut client).await;
        assert_eq!(header.request_id, 99);
        assert_eq!(reply.labels, vec![Category::Good.label()]);
    }

    #[tokio::test]
    async fn test_unknown_opcode_keeps_connection_open() {
        let mut client = start(service(10)).await;
        let body = payload(vec![[0.0; 6]]);
        client.write_all(&raw_frame(9, 5, &body)).await.unwrap();

        let (header, reply) = read_reply(&mut client).await;
        assert_eq!(header.request_id, 5);
        assert_eq!(reply.status, STATUS_INVALID_INPUT);
        assert!(reply.message.contains("unknown opcode 9"));

        client.write_all(&max_reading_frame(6)).await.unwrap();
        let (header, reply) = read_reply(&mut client).await;
        assert_eq!(header.request_id, 6);
        assert_eq!(reply.status, STATUS_OK);
        assert_eq!(reply.labels, vec![Category::VeryUnhealthy.label()]);
    }

    #[tokio::test]
    async fn test_invalid_payload_keeps_connection_open() {
        let mut client = start(service(10)).await;
        client.write_all(&raw_frame(OP_PREDICT, 1, &[0xFF; 3])).await.unwrap();

        let (_, reply) = read_reply(&mut client).await;
        assert_eq!(reply.status, STATUS_INVALID_INPUT);
        assert!(reply.labels.is_empty());

        client.write_all(&max_reading_frame(2)).await.unwrap();
        let (header, reply) = read_reply(&mut client).await;
        assert_eq!(header.request_id, 2);
        assert_eq!(reply.status, STATUS_OK);
    }

    #[tokio::test]
    async fn test_bad_magic_closes_connection() {
        let svc = service(10);
        let stats = svc.stats();
        let mut client = start(svc).await;

        let mut frame = max_reading_frame(3);
        frame[0] = 0;
        frame[1] = 0;
        client.write_all(&frame).await.unwrap();

        let mut buf = [0u8; HEADER_LEN];
        let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0);
        assert_eq!(stats.take(), (0, 0, 1));
    }
}
