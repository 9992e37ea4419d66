// ===============================
// src/recorder.rs
// ===============================
//
// Chart feed as JSONL, one Event per line:
// - setiap fill (urut waktu) + cumulative cost -> line chart
// - setiap posisi + allocation share           -> pie chart
// - totals di baris terakhir
//
// Truncates on open: the feed describes this run only.
//
// ENV: set `RECORD_FILE=/path/to/chart.jsonl` agar aktif (lihat main.rs).
//
use std::path::Path;
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
};
use tracing::{error, info};

use crate::domain::Event;
use crate::pipeline::RunReport;
use crate::valuation::allocation;

const FLUSH_EVERY_N_EVENTS: u32 = 1000;

async fn open_writer(path: &Path) -> std::io::Result<BufWriter<File>> {
    // Pastikan parent directory ada (kalau ada)
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(BufWriter::new(File::create(path).await?))
}

/// Drain `rx` into `path` until every sender is dropped.
pub async fn run(mut rx: mpsc::Receiver<Event>, path: impl AsRef<Path>) -> std::io::Result<u64> {
    let path = path.as_ref();
    info!(path = %path.display(), "recorder: started");
    let mut writer = open_writer(path).await?;

    let mut written: u64 = 0;
    let mut since_last_flush: u32 = 0;
    while let Some(ev) = rx.recv().await {
        let line = match serde_json::to_string(&ev) {
            Ok(s) => s,
            Err(e) => {
                error!(?e, "recorder: serialize error, skip event");
                continue;
            }
        };
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        written += 1;

        since_last_flush += 1;
        if since_last_flush >= FLUSH_EVERY_N_EVENTS {
            writer.flush().await?;
            since_last_flush = 0;
        }
    }

    // Channel closed: flush dan keluar
    writer.flush().await?;
    info!(events = written, "recorder: channel closed, stopped");
    Ok(written)
}

/// Feed the report through the recorder: fills with running cost, then
/// positions with their allocation, then totals.
pub async fn record_report(report: &RunReport, path: impl AsRef<Path>) -> std::io::Result<u64> {
    let (tx, rx) = mpsc::channel::<Event>(8192);
    let path = path.as_ref().to_path_buf();
    let handle = tokio::spawn(async move { run(rx, path).await });

    let mut cumulative_cost = 0.0;
    for fill in &report.fills {
        cumulative_cost += fill.total_cost;
        if tx.send(Event::Fill { fill: fill.clone(), cumulative_cost }).await.is_err() {
            break; // recorder sudah berhenti (error tulis), lihat hasil join
        }
    }
    for position in &report.positions {
        let ev = Event::Position {
            position: position.clone(),
            allocation: allocation(position, &report.totals),
        };
        if tx.send(ev).await.is_err() {
            break;
        }
    }
    let _ = tx.send(Event::Totals(report.totals.clone())).await;
    drop(tx);

    handle
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("recorder task: {e}")))?
}
