//  WATCHER.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 10:31:26
//  Last edited:
//    04 Apr 2023, 17:01:13
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the deployment-directory watcher, which forwards newly
//!   created deployment artifacts into the driver's main loop.
//

use std::path::{Path, PathBuf};

use log::{debug, error};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub use crate::errors::WatcherError as Error;


/***** CONSTANTS *****/
/// The artifact extensions the driver knows how to unpack.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = [ "zip", "experiment" ];





/***** HELPER FUNCTIONS *****/
/// Returns whether the given path carries one of the supported artifact extensions.
#[inline]
pub fn is_artifact(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext))
}





/***** LIBRARY *****/
/// Watches the deployment directory and yields newly created artifacts.
///
/// The notify backend calls back from its own thread; events are bridged into the async main loop over an unbounded channel, which is why `enqueue`-side work never happens inside the callback.
pub struct DeployWatcher {
    /// The underlying watcher, kept alive for as long as events are wanted.
    _watcher : RecommendedWatcher,
    /// The receiving end of the event bridge.
    receiver : UnboundedReceiver<PathBuf>,
}

impl DeployWatcher {
    /// Constructor for the DeployWatcher, which starts watching immediately.
    ///
    /// # Arguments
    /// - `dir`: The deployment directory to watch (non-recursively).
    ///
    /// # Returns
    /// A new DeployWatcher instance whose `next()` yields dropped artifacts.
    ///
    /// # Errors
    /// This function errors if the platform watcher cannot be created or the directory cannot be registered with it.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir: &Path = dir.as_ref();

        let (sender, receiver): (UnboundedSender<PathBuf>, UnboundedReceiver<PathBuf>) = mpsc::unbounded_channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_)) { return; }
                    for path in event.paths {
                        if !is_artifact(&path) {
                            debug!("Ignoring created file '{}' (not a deployment artifact).", path.display());
                            continue;
                        }
                        // Only fails when the receiver is gone, i.e., the driver is shutting down
                        let _ = sender.send(path);
                    }
                },
                Err(err) => { error!("Deployment watcher reported an error: {}", err); },
            }
        }).map_err(|err| Error::CreateError{ err })?;
        watcher.watch(dir, RecursiveMode::NonRecursive).map_err(|err| Error::WatchError{ path: dir.into(), err })?;

        debug!("Watching deployment directory '{}'.", dir.display());
        Ok(Self {
            _watcher : watcher,
            receiver,
        })
    }

    /// Yields the next dropped artifact, waiting if none is pending.
    ///
    /// # Returns
    /// The path of the created artifact, or `None` if the watcher backend has gone away.
    #[inline]
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.receiver.recv().await
    }
}
