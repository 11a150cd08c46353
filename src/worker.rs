use crate::analyzer::{AnalysisError, FileAnalyzer};
use crate::diff::DiffResult;
use crate::source::VersionSource;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, error};

/// Messages sent to the analysis thread
pub enum AnalyzerMessage {
    /// Analyze the full history of one file
    Analyze(String),
    /// Stop the analysis thread after the current file
    Stop,
}

pub enum AnalyzerResponse {
    Finished(Box<DiffResult>),
    Failed { file: String, error: AnalysisError },
}

pub struct AnalysisWorker {
    analyzer: FileAnalyzer,
    source: Arc<dyn VersionSource>,
    receiver: Receiver<AnalyzerMessage>,
    response_sender: Sender<AnalyzerResponse>,
}

impl AnalysisWorker {
    pub fn new(
        analyzer: FileAnalyzer,
        source: Arc<dyn VersionSource>,
        receiver: Receiver<AnalyzerMessage>,
        response_sender: Sender<AnalyzerResponse>,
    ) -> Self {
        Self {
            analyzer,
            source,
            receiver,
            response_sender,
        }
    }

    pub fn run(&self) {
        while let Ok(message) = self.receiver.recv() {
            match message {
                AnalyzerMessage::Analyze(file) => {
                    let response = match self.analyzer.analyze(self.source.as_ref(), &file) {
                        Ok(result) => AnalyzerResponse::Finished(Box::new(result)),
                        Err(error) => {
                            error!("Failed to analyze {}: {}", file, error);
                            AnalyzerResponse::Failed { file, error }
                        }
                    };
                    if self.response_sender.send(response).is_err() {
                        debug!("Response receiver dropped, stopping analysis thread");
                        break;
                    }
                }
                AnalyzerMessage::Stop => break,
            }
        }
    }
}

/// Start a background analysis thread.
///
/// Files are analyzed one at a time in the order they are sent; one response
/// is produced per file.
pub fn spawn_analyzer(
    analyzer: FileAnalyzer,
    source: Arc<dyn VersionSource>,
) -> (
    Sender<AnalyzerMessage>,
    Receiver<AnalyzerResponse>,
    thread::JoinHandle<()>,
) {
    let (sender, receiver) = mpsc::channel();
    let (response_sender, response_receiver) = mpsc::channel();
    let handle = thread::spawn(move || {
        let worker = AnalysisWorker::new(analyzer, source, receiver, response_sender);
        worker.run();
    });
    (sender, response_receiver, handle)
}

/// Analyze independent files on up to `threads` scoped threads. Results come
/// back in the order of `files`.
pub fn analyze_parallel(
    analyzer: &FileAnalyzer,
    source: &dyn VersionSource,
    files: &[String],
    threads: usize,
) -> Vec<Result<DiffResult, AnalysisError>> {
    if files.is_empty() {
        return Vec::new();
    }
    let chunk_size = files.len().div_ceil(threads.max(1));

    thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|file| {
                            analyzer.analyze(source, file).inspect_err(|e| {
                                error!("Failed to analyze {}: {}", file, e);
                            })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
