use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::common::{self, InvocationPhase, PhaseTracker};
use super::options::RunnerOptions;
use super::traits::Runner;
use crate::{
    command::PreparedCommand,
    error::Result,
    lifecycle::EnvManager,
    progress::{OutputStream, ProgressDisplay, ProgressState},
    types::{CommandResult, RunOptions},
};

/// Runs commands while estimating and drawing their progress
///
/// Both pipes are drained by reader threads into a channel; the calling thread owns
/// the progress state and redraws at least once per poll interval.
#[derive(Debug, Default, Clone)]
pub struct ProgressRunner {
    manager: Option<Arc<EnvManager>>,
    options: RunnerOptions,
}

/// How long output already in flight is still collected once the child has exited
const EXIT_GRACE: Duration = Duration::from_millis(250);

/// Everything a finished progress loop hands back
struct Drained {
    exit_code: i32,
    stdout: Option<String>,
    stderr: Option<String>,
}

impl ProgressRunner {
    pub const NAME: &'static str = "progress";

    pub fn new(options: RunnerOptions) -> Self {
        Self {
            manager: None,
            options,
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    fn display_for(&self, command: &[String]) -> ProgressDisplay {
        let title = command.first().map(String::as_str).unwrap_or_default();
        ProgressDisplay::new(
            title,
            self.options.show_progress,
            self.options.inline_output,
        )
    }

    fn run_with_capture(
        &self,
        prepared: &PreparedCommand,
        tracker: &mut PhaseTracker,
        state: &mut ProgressState,
        display: &mut ProgressDisplay,
    ) -> Result<Drained> {
        let mut cmd = prepared.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd
            .spawn()
            .map_err(|source| tracker.fail(common::launch_error(prepared, source)))?;
        tracker.advance(InvocationPhase::Launched);

        let (tx, rx) = mpsc::channel();
        let pumps = match start_pumps(&mut child, tx) {
            Ok(pumps) => pumps,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(tracker.fail(e.into()));
            }
        };
        tracker.advance(InvocationPhase::Reading);

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exited: Option<ExitStatus> = None;
        let mut deadline: Option<Instant> = None;
        let mut disconnected = false;
        loop {
            let timeout = deadline
                .map(|d| d.saturating_duration_since(Instant::now()))
                .unwrap_or(self.options.poll_interval);
            match rx.recv_timeout(timeout) {
                Ok((stream, chunk)) => {
                    match stream {
                        OutputStream::Stdout => stdout.push_str(&chunk),
                        OutputStream::Stderr => stderr.push_str(&chunk),
                    }
                    // carriage returns redraw a line in place; each redraw is an update
                    for line in chunk.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
                        state.observe(line, stream);
                        display.push_line(line);
                    }
                    display.update(state);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if exited.is_none() {
                        state.tick();
                        display.update(state);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }

            match exited {
                None => {
                    if let Some(status) = child.try_wait().map_err(|e| tracker.fail(e.into()))? {
                        exited = Some(status);
                        deadline = Some(Instant::now() + EXIT_GRACE);
                    }
                }
                Some(_) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    debug!(
                        "`{}` exited but a descendant still holds its output open",
                        prepared.command_line()
                    );
                    break;
                }
                Some(_) => {}
            }
        }

        // pumps blocked on a pipe a descendant still holds are left to finish on their own
        for pump in pumps {
            if !disconnected && !pump.is_finished() {
                continue;
            }
            if pump.join().is_err() {
                warn!("Output reader thread panicked");
            }
        }

        let status = match exited {
            Some(status) => status,
            None => child.wait().map_err(|e| tracker.fail(e.into()))?,
        };
        Ok(Drained {
            exit_code: common::exit_code(status),
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }

    /// Output goes straight to the terminal; the bar only shows liveness
    fn run_without_capture(
        &self,
        prepared: &PreparedCommand,
        tracker: &mut PhaseTracker,
        state: &mut ProgressState,
        display: &mut ProgressDisplay,
    ) -> Result<Drained> {
        let mut child = prepared
            .to_command()
            .spawn()
            .map_err(|source| tracker.fail(common::launch_error(prepared, source)))?;
        tracker.advance(InvocationPhase::Launched);

        let status = loop {
            match child.try_wait().map_err(|e| tracker.fail(e.into()))? {
                Some(status) => break status,
                None => {
                    state.tick();
                    display.update(state);
                    thread::sleep(self.options.poll_interval);
                }
            }
        };

        Ok(Drained {
            exit_code: common::exit_code(status),
            stdout: None,
            stderr: None,
        })
    }
}

impl Runner for ProgressRunner {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn bind(self: Box<Self>, manager: Arc<EnvManager>) -> Box<dyn Runner> {
        Box::new(Self {
            manager: Some(manager),
            options: self.options,
        })
    }

    fn manager(&self) -> Option<&Arc<EnvManager>> {
        self.manager.as_ref()
    }

    fn run(&self, command: &[String], options: &RunOptions) -> Result<CommandResult> {
        let mut tracker = PhaseTracker::new(Self::NAME);
        let manager = common::require_manager(Self::NAME, self.manager.as_ref())?;

        tracker.advance(InvocationPhase::Preparing);
        let prepared = manager
            .prepare_command(command, options)
            .map_err(|e| tracker.fail(e))?;

        let mut state = ProgressState::new();
        let mut display = self.display_for(command);
        let drained = if prepared.options().capture_output {
            self.run_with_capture(&prepared, &mut tracker, &mut state, &mut display)?
        } else {
            self.run_without_capture(&prepared, &mut tracker, &mut state, &mut display)?
        };

        state.finish(drained.exit_code);
        display.finish(&state);
        tracker.advance(InvocationPhase::Completed);
        debug!(
            "Progress run of `{}` finished: {}",
            prepared.command_line(),
            state.snippet()
        );

        let result = CommandResult {
            command: prepared.logical().to_vec(),
            exit_code: drained.exit_code,
            stdout: drained.stdout,
            stderr: drained.stderr,
        };
        common::finish(result, prepared.options().check)
    }
}

type Line = (OutputStream, String);

fn start_pumps(child: &mut Child, tx: Sender<Line>) -> io::Result<Vec<JoinHandle<()>>> {
    let mut pumps = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        pumps.push(spawn_pump(out, OutputStream::Stdout, tx.clone())?);
    }
    if let Some(err) = child.stderr.take() {
        pumps.push(spawn_pump(err, OutputStream::Stderr, tx)?);
    }
    Ok(pumps)
}

/// Forward `reader` line by line until EOF or until the receiver goes away
fn spawn_pump<R>(reader: R, stream: OutputStream, tx: Sender<Line>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("envrunner-{stream:?}").to_lowercase())
        .spawn(move || {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match read_segment(&mut reader, &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        if tx.send((stream, line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("Stopped reading {:?}: {}", stream, e);
                        break;
                    }
                }
            }
        })
}

/// Like `read_until(b'\n')`, except a carriage return also ends the segment so
/// in-place redraws arrive as they happen
fn read_segment<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut read = 0;
    loop {
        let (done, used) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    buf.extend_from_slice(&available[..=i]);
                    (true, i + 1)
                }
                None => {
                    buf.extend_from_slice(available);
                    (available.is_empty(), available.len())
                }
            }
        };
        reader.consume(used);
        read += used;
        if done {
            return Ok(read);
        }
    }
}
