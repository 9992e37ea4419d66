// ===============================
// src/oracle.rs
// ===============================
use std::time::{Duration, Instant};

use url::Url;

use crate::error::{PipelineError, QuoteUnavailable};
use crate::metrics::QUOTE_LATENCY;
use crate::okx::{inst_id, parse_ticker, TICKER_PATH};

/// Resolves one latest price per instrument. Failures are values, not errors:
/// the caller turns them into an empty price on the affected row.
pub trait PriceSource {
    /// Request key for a raw symbol. Symbols sharing a key share one request.
    fn instrument(&self, symbol: &str) -> String {
        symbol.to_string()
    }

    async fn latest_price(&self, instrument: &str) -> Result<f64, QuoteUnavailable>;
}

/// OKX public ticker (REST). One GET per call, no retry.
pub struct OkxTicker {
    http: reqwest::Client,
    base_url: String,
    quote_ccy: String,
}

impl OkxTicker {
    pub fn new(base_url: &str, quote_ccy: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("http client: {e}")))?;
        Self::with_client(http, base_url, quote_ccy)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, quote_ccy: &str) -> Result<Self, PipelineError> {
        Url::parse(base_url).map_err(|e| PipelineError::Config(format!("quote base url {base_url:?}: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_ccy: quote_ccy.to_string(),
        })
    }

    fn ticker_url(&self, instrument: &str) -> Result<Url, QuoteUnavailable> {
        Url::parse_with_params(&format!("{}{}", self.base_url, TICKER_PATH), &[("instId", instrument)])
            .map_err(|e| QuoteUnavailable::Request(e.to_string()))
    }

    async fn fetch(&self, instrument: &str) -> Result<f64, QuoteUnavailable> {
        let url = self.ticker_url(instrument)?;
        let rsp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuoteUnavailable::Request(e.to_string()))?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(QuoteUnavailable::Status(status.as_u16()));
        }
        let body = rsp.text().await.map_err(|e| QuoteUnavailable::Request(e.to_string()))?;
        parse_ticker(&body)
    }
}

impl PriceSource for OkxTicker {
    fn instrument(&self, symbol: &str) -> String {
        inst_id(symbol, &self.quote_ccy)
    }

    async fn latest_price(&self, instrument: &str) -> Result<f64, QuoteUnavailable> {
        let started = Instant::now();
        let out = self.fetch(instrument).await;
        QUOTE_LATENCY.observe(started.elapsed().as_secs_f64() * 1_000.0);
        out
    }
}

/// `--offline`: every symbol is unpriced, nothing touches the network.
pub struct Offline;

impl PriceSource for Offline {
    async fn latest_price(&self, _instrument: &str) -> Result<f64, QuoteUnavailable> {
        Err(QuoteUnavailable::Disabled)
    }
}

/// Deterministic quotes for tests.
#[cfg(test)]
pub struct FixedPrices(pub ahash::AHashMap<String, f64>);

#[cfg(test)]
impl FixedPrices {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        Self(prices.iter().map(|(s, p)| (s.to_string(), *p)).collect())
    }
}

#[cfg(test)]
impl PriceSource for FixedPrices {
    async fn latest_price(&self, instrument: &str) -> Result<f64, QuoteUnavailable> {
        self.0.get(instrument).copied().ok_or(QuoteUnavailable::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    // Tiny HTTP 1.1 responder: answers `n` connections with the same reply and
    // hands back each request line.
    fn serve(n: usize, status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for conn in listener.incoming().take(n) {
                let mut stream = conn.unwrap();
                let mut req = Vec::new();
                let mut buf = [0u8; 1024];
                while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(k) => req.extend_from_slice(&buf[..k]),
                    }
                }
                let text = String::from_utf8_lossy(&req);
                let _ = tx.send(text.lines().next().unwrap_or_default().to_string());
                let rsp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(rsp.as_bytes());
                let _ = stream.flush();
            }
        });
        (format!("http://{addr}"), rx)
    }

    fn client(base: &str) -> OkxTicker {
        // no_proxy: env proxy tidak boleh membelokkan request ke 127.0.0.1
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        OkxTicker::with_client(http, base, "USDT").unwrap()
    }

    #[tokio::test]
    async fn requests_usdt_pair_and_reads_last() {
        let (base, rx) = serve(1, "200 OK", r#"{"code":"0","msg":"","data":[{"instId":"BTC-USDT","last":"250"}]}"#);
        let okx = client(&base);
        let inst = okx.instrument("BTC-SWAP");
        assert_eq!(inst, "BTC-USDT");
        assert_eq!(okx.latest_price(&inst).await, Ok(250.0));
        let request_line = rx.recv().unwrap();
        assert_eq!(request_line, "GET /api/v5/market/ticker?instId=BTC-USDT HTTP/1.1");
    }

    #[tokio::test]
    async fn non_2xx_is_unavailable() {
        let (base, _rx) = serve(1, "503 Service Unavailable", r#"{"msg":"busy"}"#);
        assert_eq!(client(&base).latest_price("BTC-USDT").await, Err(QuoteUnavailable::Status(503)));
    }

    #[tokio::test]
    async fn empty_data_is_unavailable() {
        let (base, _rx) = serve(1, "200 OK", r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#);
        assert_eq!(client(&base).latest_price("NOPE-USDT").await, Err(QuoteUnavailable::Empty));
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        // listener sudah di-drop, port tertutup
        let out = client(&format!("http://{addr}")).latest_price("BTC-USDT").await;
        assert!(matches!(out, Err(QuoteUnavailable::Request(_))), "{out:?}");
    }

    #[tokio::test]
    async fn silent_host_times_out_as_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // terima koneksi, tidak pernah membalas
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let okx = OkxTicker::with_client(http, &format!("http://{addr}"), "USDT").unwrap();

        let started = Instant::now();
        let out = tokio::time::timeout(Duration::from_secs(2), okx.latest_price("BTC-USDT"))
            .await
            .expect("client timeout did not fire");
        assert!(matches!(out, Err(QuoteUnavailable::Request(_))), "{out:?}");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            OkxTicker::new("not a url", "USDT", Duration::from_secs(1)),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn offline_never_prices() {
        assert_eq!(Offline.instrument("BTC-SWAP"), "BTC-SWAP");
        assert_eq!(Offline.latest_price("BTC").await, Err(QuoteUnavailable::Disabled));
    }
}
