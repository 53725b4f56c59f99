//! # Generation Worker
//!
//! One dedicated worker thread runs generations to completion, one at a
//! time, owning the cache context across runs. Submissions arriving while
//! a generation is in flight coalesce into a single pending slot (latest
//! wins) — two generations never race the shared caches. There is no
//! mid-flight cancellation; the document layer discards superseded
//! outcomes by generation id.

use crate::builder::{FillMeshProvider, StrokeMeshBuilder};
use crate::cache::CacheContext;
use crate::generator::{GeneratorSettings, MeshGenerator};
use crate::object::GenerationOutcome;
use parking_lot::{Condvar, Mutex};
use sculpt_snapshot::Snapshot;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Default)]
struct WorkerState {
    pending: Option<Snapshot>,
    shutdown: bool,
}

struct WorkerShared {
    state: Mutex<WorkerState>,
    wake: Condvar,
}

/// Handle to the generation worker thread.
///
/// Dropping the handle shuts the worker down after the in-flight
/// generation (if any) completes.
///
/// # Example
///
/// ```rust,ignore
/// let worker = GenerationWorker::spawn(builder, None, GeneratorSettings::default());
/// worker.submit(snapshot);
/// let outcome = worker.outcomes().recv()?;
/// ```
pub struct GenerationWorker {
    shared: Arc<WorkerShared>,
    outcomes: Receiver<GenerationOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl GenerationWorker {
    /// Spawns the worker thread.
    pub fn spawn(
        builder: Arc<dyn StrokeMeshBuilder>,
        fill_meshes: Option<Arc<dyn FillMeshProvider>>,
        settings: GeneratorSettings,
    ) -> Self {
        let shared = Arc::new(WorkerShared {
            state: Mutex::new(WorkerState::default()),
            wake: Condvar::new(),
        });
        let (sender, outcomes) = channel();
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            run_worker(&worker_shared, &builder, fill_meshes.as_deref(), settings, &sender);
        });
        Self {
            shared,
            outcomes,
            handle: Some(handle),
        }
    }

    /// Enqueues a snapshot for generation.
    ///
    /// If a snapshot is already pending it is replaced — edits arriving
    /// faster than generations complete collapse into one regeneration.
    pub fn submit(&self, snapshot: Snapshot) {
        let mut state = self.shared.state.lock();
        if state.pending.replace(snapshot).is_some() {
            tracing::debug!("coalescing generation request");
        }
        self.shared.wake.notify_one();
    }

    /// The channel completed generations arrive on, in submission order.
    pub fn outcomes(&self) -> &Receiver<GenerationOutcome> {
        &self.outcomes
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.wake.notify_one();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    shared: &WorkerShared,
    builder: &Arc<dyn StrokeMeshBuilder>,
    fill_meshes: Option<&dyn FillMeshProvider>,
    settings: GeneratorSettings,
    sender: &Sender<GenerationOutcome>,
) {
    // The cache context lives here, handed into each generation in turn.
    let mut cache = CacheContext::new();
    let mut next_generation_id = 1_u64;
    loop {
        let snapshot = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(snapshot) = state.pending.take() {
                    break snapshot;
                }
                shared.wake.wait(&mut state);
            }
        };

        let mut generator =
            MeshGenerator::new(snapshot, builder.as_ref(), &mut cache, settings.clone())
                .with_generation_id(next_generation_id);
        if let Some(provider) = fill_meshes {
            generator = generator.with_fill_meshes(provider);
        }
        let outcome = generator.generate();
        next_generation_id += 1;

        if sender.send(outcome).is_err() {
            // Receiver gone; nothing left to generate for.
            return;
        }
    }
}
