//! Background request worker.
//!
//! The view loops never block on the network: they `submit` requests here
//! and pick up `Completion`s between frames. Each request gets a sequence
//! number at submit time. Before running anything the worker drains its
//! queue and keeps only the newest request of each kind, so a burst of
//! keystrokes costs one round trip instead of one per key.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::SourceError;
use crate::types::{FontRender, FontRequest, Playlist};

use super::FrameSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    RenderText(FontRequest),
    Playlist { site: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    RenderText,
    Playlist,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::RenderText(_) => RequestKind::RenderText,
            Request::Playlist { .. } => RequestKind::Playlist,
        }
    }
}

#[derive(Debug)]
pub enum Response {
    Rendered(FontRender),
    Playlist(Playlist),
}

#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub kind: RequestKind,
    pub result: Result<Response, SourceError>,
}

/// Admits only results newer than anything admitted before.
#[derive(Debug, Default, Clone)]
pub struct LatestWins {
    newest: Option<u64>,
}

impl LatestWins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, seq: u64) -> bool {
        match self.newest {
            Some(newest) if seq <= newest => false,
            _ => {
                self.newest = Some(seq);
                true
            }
        }
    }
}

pub struct Worker {
    requests: Option<Sender<(u64, Request)>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl Worker {
    pub fn spawn<S: FrameSource + Send + 'static>(source: S) -> io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("flipdisc-requests".into())
            .spawn(move || run(source, req_rx, done_tx))?;
        Ok(Worker {
            requests: Some(req_tx),
            completions: done_rx,
            handle: Some(handle),
            next_seq: 1,
        })
    }

    /// Queue a request and return its sequence number, or `None` when the
    /// worker thread has exited and nothing will answer.
    pub fn submit(&mut self, request: Request) -> Option<u64> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let tx = self.requests.as_ref()?;
        if tx.send((seq, request)).is_err() {
            tracing::warn!(seq, "request worker is gone, dropping request");
            return None;
        }
        Some(seq)
    }

    /// False once the worker thread has exited.
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Next finished request, without waiting.
    pub fn try_recv(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Next finished request, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        self.completions.recv_timeout(timeout).ok()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop after its current request.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("request worker panicked");
            }
        }
    }
}

fn run<S: FrameSource>(source: S, requests: Receiver<(u64, Request)>, done: Sender<Completion>) {
    while let Ok(first) = requests.recv() {
        let mut pending = vec![first];
        while let Ok(next) = requests.try_recv() {
            pending.push(next);
        }

        for (seq, request) in coalesce(pending) {
            let kind = request.kind();
            let result = match request {
                Request::RenderText(req) => source.render_text(&req).map(Response::Rendered),
                Request::Playlist { site } => source.get_playlist(&site).map(Response::Playlist),
            };
            if let Err(e) = &result {
                tracing::debug!(seq, ?kind, "request failed: {e}");
            }
            if done.send(Completion { seq, kind, result }).is_err() {
                return;
            }
        }
    }
    tracing::debug!("request worker stopped");
}

/// Keep the newest request of each kind, in submission order.
fn coalesce(pending: Vec<(u64, Request)>) -> Vec<(u64, Request)> {
    let mut kept: Vec<(u64, Request)> = Vec::with_capacity(2);
    for (seq, request) in pending {
        let kind = request.kind();
        if let Some(slot) = kept.iter_mut().find(|(_, r)| r.kind() == kind) {
            tracing::trace!(stale = slot.0, seq, "superseded request dropped");
            *slot = (seq, request);
        } else {
            kept.push((seq, request));
        }
    }
    kept.sort_by_key(|(seq, _)| *seq);
    kept
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::types::{Board, PlaylistItem};

    const WAIT: Duration = Duration::from_secs(5);

    /// Echoes the request text length as a one-row board; records calls.
    #[derive(Clone, Default)]
    struct EchoSource {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl FrameSource for EchoSource {
        fn render_text(&self, request: &FontRequest) -> Result<FontRender, SourceError> {
            self.seen.lock().unwrap().push(request.text.clone());
            Ok(FontRender::Single(Board::new(vec![vec![true; request.text.len()]])))
        }

        fn get_playlist(&self, site: &str) -> Result<Playlist, SourceError> {
            if site == "down" {
                return Err(SourceError::Status {
                    url: format!("/v1/sites/{site}/playing"),
                    status: 502,
                });
            }
            Ok(Playlist {
                videos: vec![PlaylistItem::default()],
            })
        }
    }

    fn text(t: &str) -> Request {
        Request::RenderText(FontRequest {
            font_name: "TI84".into(),
            text: t.into(),
            space_width: 1,
            kerning: 0,
        })
    }

    #[test]
    fn gate_rejects_stale_and_repeated_sequences() {
        let mut gate = LatestWins::new();
        assert!(gate.admit(2));
        assert!(!gate.admit(1));
        assert!(!gate.admit(2));
        assert!(gate.admit(5));
        assert!(!gate.admit(3));
    }

    #[test]
    fn coalesce_keeps_newest_of_each_kind() {
        let pending = vec![
            (1, text("h")),
            (2, Request::Playlist { site: "a".into() }),
            (3, text("he")),
            (4, text("hey")),
        ];
        let kept = coalesce(pending);
        assert_eq!(
            kept,
            vec![(2, Request::Playlist { site: "a".into() }), (4, text("hey"))]
        );
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut worker = Worker::spawn(EchoSource::default()).unwrap();
        let a = worker.submit(text("a")).unwrap();
        let b = worker.submit(text("b")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn newest_render_is_always_delivered() {
        let source = EchoSource::default();
        let mut worker = Worker::spawn(source.clone()).unwrap();
        let mut last = 0;
        for t in ["h", "he", "hel", "hell", "hello"] {
            last = worker.submit(text(t)).unwrap();
        }

        let mut gate = LatestWins::new();
        let mut applied = None;
        while let Some(done) = worker.recv_timeout(WAIT) {
            if gate.admit(done.seq) {
                if let Ok(Response::Rendered(render)) = done.result {
                    applied = Some(render);
                }
            }
            if done.seq == last {
                break;
            }
        }

        assert_eq!(applied.map(|r| r.dot_count()), Some(5));
        assert_eq!(source.seen.lock().unwrap().last().map(String::as_str), Some("hello"));
    }

    #[test]
    fn failures_come_back_as_completions() {
        let mut worker = Worker::spawn(EchoSource::default()).unwrap();
        let seq = worker.submit(Request::Playlist { site: "down".into() }).unwrap();
        let done = worker.recv_timeout(WAIT).expect("completion");
        assert_eq!(done.seq, seq);
        assert_eq!(done.kind, RequestKind::Playlist);
        assert!(matches!(done.result, Err(SourceError::Status { status: 502, .. })));
    }

    #[test]
    fn drop_joins_the_worker() {
        let source = EchoSource::default();
        {
            let mut worker = Worker::spawn(source.clone()).unwrap();
            worker.submit(text("bye")).unwrap();
        }
        // The queued request ran before the thread exited.
        assert_eq!(source.seen.lock().unwrap().as_slice(), ["bye".to_string()]);
    }

    struct PanickingSource;

    impl FrameSource for PanickingSource {
        fn render_text(&self, _: &FontRequest) -> Result<FontRender, SourceError> {
            panic!("render exploded");
        }

        fn get_playlist(&self, _: &str) -> Result<Playlist, SourceError> {
            panic!("playlist exploded");
        }
    }

    #[test]
    fn dead_worker_refuses_requests() {
        let mut worker = Worker::spawn(PanickingSource).unwrap();
        assert!(worker.submit(text("boom")).is_some());

        let deadline = std::time::Instant::now() + WAIT;
        while worker.is_alive() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!worker.is_alive());
        assert!(worker.try_recv().is_none());
        assert_eq!(worker.submit(text("again")), None);
    }
}
