use anyhow::{bail, Context};
use iodcore::telemetry::MetricsRecorder;
use log::{debug, info};
use std::ffi::OsString;
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tokio::runtime::Builder as TokioBuilder;
use tokio::sync::Semaphore;

/// One external program run.
#[derive(Clone, Debug)]
pub struct Job {
    pub label: String,
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Job {
    pub fn new<P, I, A>(label: impl Into<String>, program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            label: label.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct JobOutput {
    pub label: String,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutput {
    pub fn ensure_success(&self) -> anyhow::Result<()> {
        if !self.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.label,
                self.status,
                self.stderr.trim()
            );
        }
        Ok(())
    }
}

/// Runs jobs on a multi-thread runtime with at most `workers` in flight.
/// Results come back in submission order once every job is done.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, jobs: Vec<Job>) -> anyhow::Result<Vec<JobOutput>> {
        info!("running {} jobs on {} workers", jobs.len(), self.workers);
        let outputs = self.map(jobs, run_job)?;

        let outcomes = MetricsRecorder::new();
        for output in &outputs {
            if output.status.success() {
                outcomes.record_processed();
            } else {
                outcomes.record_error();
            }
        }
        let (succeeded, failed) = outcomes.snapshot();
        info!("{} jobs succeeded, {} failed", succeeded, failed);
        Ok(outputs)
    }

    /// Applies `task` to every item, bounded by the pool size.
    pub fn map<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> anyhow::Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let runtime = TokioBuilder::new_multi_thread()
            .worker_threads(self.workers)
            .enable_all()
            .build()
            .context("creating worker pool runtime")?;

        runtime.block_on(async {
            let permits = Arc::new(Semaphore::new(self.workers));
            let mut handles = Vec::with_capacity(items.len());
            for item in items {
                let permits = permits.clone();
                let fut = task(item);
                handles.push(tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .context("worker pool closed")?;
                    fut.await
                }));
            }

            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                results.push(handle.await.context("worker task panicked")??);
            }
            Ok(results)
        })
    }
}

async fn run_job(job: Job) -> anyhow::Result<JobOutput> {
    debug!("{}: {:?} {:?}", job.label, job.program, job.args);
    let output = Command::new(&job.program)
        .args(&job.args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("spawning {:?} for {}", job.program, job.label))?;

    Ok(JobOutput {
        label: job.label,
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
