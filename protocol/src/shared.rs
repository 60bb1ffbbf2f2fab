use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashSet;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use vastsweeper_core::{Chunk, ChunkCache, ChunkLayout, Coord2, RevealEngine, WorldGrid};

use crate::*;

/// Observational counters; they only ever grow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    pub exploded_mines: u64,
    pub unique_users: u64,
    pub version: u64,
}

/// Engine and the chunk layout it is addressed through; replaced together on reset.
struct WorldState {
    engine: RevealEngine,
    layout: ChunkLayout,
}

/// The single owner of world state shared by every connection.
///
/// Reveal, flag, chord and reset run one at a time under the write lock. Chunk extraction takes the
/// read lock, so it sees a world either before or after a mutation, never in between, and may run
/// alongside other extractions. The chunk cache is only ever tried, never waited on: a busy cache
/// means extracting without it.
pub struct SharedWorld {
    state: RwLock<WorldState>,
    cache: Mutex<ChunkCache>,
    seen_users: Mutex<HashSet<String>>,
    unique_users: AtomicU64,
}

impl SharedWorld {
    pub fn new(settings: &WorldSettings) -> Result<Self> {
        settings.validate()?;
        let layout = settings.chunk_layout()?;
        let world = WorldGrid::initialize(settings.world_config(), settings.resolve_seed())?;
        Ok(Self::from_engine(
            RevealEngine::new(world),
            layout,
            settings.chunk_cache,
        ))
    }

    pub fn from_engine(engine: RevealEngine, layout: ChunkLayout, chunk_cache: usize) -> Self {
        Self {
            state: RwLock::new(WorldState { engine, layout }),
            cache: Mutex::new(ChunkCache::new(chunk_cache)),
            seen_users: Mutex::new(HashSet::new()),
            unique_users: AtomicU64::new(0),
        }
    }

    pub fn layout(&self) -> ChunkLayout {
        self.state.read().layout
    }

    /// Dispatches a parsed request. Updates go to every observer, a chunk only to the requester.
    pub fn handle(&self, request: Request) -> Reply {
        log::trace!("Handling {:?}", request);
        match request {
            Request::Reveal(target) => self.reveal(target),
            Request::Flag(target) => self.flag(target),
            Request::Chord(target) => self.chord(target),
            Request::Chunk(ChunkRequest { chunk }) => Reply::Chunk {
                chunk: self.chunk(chunk),
            },
        }
    }

    pub fn reveal(&self, target: CellTarget) -> Reply {
        self.mutate(target, |engine, coords| engine.reveal(coords))
    }

    pub fn flag(&self, target: CellTarget) -> Reply {
        self.mutate(target, |engine, coords| {
            engine.toggle_flag(coords).into_iter().collect()
        })
    }

    pub fn chord(&self, target: CellTarget) -> Reply {
        self.mutate(target, |engine, coords| engine.chord_reveal(coords))
    }

    pub fn chunk(&self, chunk: Coord2) -> Chunk {
        let state = self.state.read();
        let version = state.engine.world().version();

        if let Some(cached) = self
            .cache
            .try_lock()
            .and_then(|cache| cache.lookup(chunk, version))
        {
            return cached;
        }

        let extracted = state.engine.extract_chunk(chunk, state.layout);
        // still under the read guard, so `version` is current
        if let Some(mut cache) = self.cache.try_lock() {
            cache.insert(version, extracted.clone());
        }
        extracted
    }

    /// Replaces the world with a freshly generated one. Counters carry over.
    pub fn reset(&self, settings: &WorldSettings) -> Result<()> {
        settings.validate()?;
        let layout = settings.chunk_layout()?;

        let mut state = self.state.write();
        state
            .engine
            .reset(settings.world_config(), settings.resolve_seed())?;
        state.layout = layout;
        *self.cache.lock() = ChunkCache::new(settings.chunk_cache);
        log::info!(
            "World reset, now at version {}",
            state.engine.world().version()
        );
        Ok(())
    }

    /// Records a user id, returning whether it was seen for the first time.
    pub fn note_user(&self, id: &str) -> bool {
        let first_time = self.seen_users.lock().insert(id.to_owned());
        if first_time {
            let total = self.unique_users.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!("New user {}, {} seen so far", id, total);
        }
        first_time
    }

    pub fn stats(&self) -> WorldStats {
        let state = self.state.read();
        WorldStats {
            exploded_mines: state.engine.exploded_mines(),
            unique_users: self.unique_users.load(Ordering::Relaxed),
            version: state.engine.world().version(),
        }
    }

    fn mutate(
        &self,
        target: CellTarget,
        operation: impl FnOnce(&mut RevealEngine, Coord2) -> Vec<Cell>,
    ) -> Reply {
        let mut state = self.state.write();
        let layout = state.layout;
        let changed = operation(&mut state.engine, target.global(layout));
        drop(state);
        Reply::updates(layout, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    fn shared(size: Coord2, mines: &[Coord2], chunk_size: Coord) -> SharedWorld {
        let world = WorldGrid::from_mine_coords(size, mines).unwrap();
        SharedWorld::from_engine(
            RevealEngine::new(world),
            ChunkLayout::new(chunk_size).unwrap(),
            16,
        )
    }

    fn updates(reply: Reply) -> Vec<CellUpdate> {
        match reply {
            Reply::Updates { updates } => updates,
            Reply::Chunk { .. } => panic!("expected updates"),
        }
    }

    #[test]
    fn new_rejects_invalid_settings() {
        let settings = WorldSettings {
            width: 0,
            ..WorldSettings::default()
        };
        assert!(matches!(
            SharedWorld::new(&settings),
            Err(ProtocolError::World(WorldError::InvalidDimensions))
        ));
    }

    #[test]
    fn new_with_seed_is_reproducible() {
        let settings = WorldSettings {
            width: 64,
            height: 64,
            seed: Some(5),
            ..WorldSettings::default()
        };
        let a = SharedWorld::new(&settings).unwrap();
        let b = SharedWorld::new(&settings).unwrap();

        for cx in 0..2 {
            for cy in 0..2 {
                assert_eq!(a.chunk((cx, cy)), b.chunk((cx, cy)));
            }
        }
    }

    #[test]
    fn reveal_translates_chunk_target() {
        let world = shared((8, 8), &[(7, 7)], 4);

        let updates = updates(world.reveal(CellTarget::new((1, 1), (2, 2))));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].chunk, (1, 1));
        assert_eq!(updates[0].local, (2, 2));
        assert_eq!(updates[0].cell.position(), (6, 6));
        assert!(updates[0].cell.is_revealed());
    }

    #[test]
    fn oversized_local_offsets_reach_other_chunks() {
        let world = shared((8, 8), &[(7, 7)], 4);

        let updates = updates(world.flag(CellTarget::new((0, 0), (5, 6))));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].chunk, (1, 1));
        assert_eq!(updates[0].local, (1, 2));
        assert!(updates[0].cell.is_flagged());
    }

    #[test]
    fn out_of_world_requests_change_nothing() {
        let world = shared((8, 8), &[], 4);

        for request in [
            Request::Reveal(CellTarget::new((2, 0), (0, 0))),
            Request::Flag(CellTarget::new((-1, 0), (3, 3))),
            Request::Chord(CellTarget::new((0, 0), (0, -1))),
        ] {
            let reply = world.handle(request);
            assert!(reply.is_broadcast());
            assert!(!reply.has_update());
        }
        assert_eq!(world.stats().version, 0);
    }

    #[test]
    fn handle_dispatches_chunk_requests() {
        let world = shared((6, 6), &[(0, 0)], 4);
        world.handle(Request::Reveal(CellTarget::new((0, 0), (0, 0))));

        let reply = world.handle(Request::Chunk(ChunkRequest { chunk: (1, 1) }));
        let Reply::Chunk { chunk } = reply else {
            panic!("expected a chunk");
        };

        assert_eq!(chunk.coord(), (1, 1));
        // placeholders beyond the world edge are hidden as well
        assert_eq!(chunk.iter().filter(|cell| cell.is_hidden()).count(), 16);
        assert_eq!(world.stats().exploded_mines, 1);
    }

    #[test]
    fn chunk_reflects_latest_mutation() {
        let world = shared((8, 8), &[(7, 7)], 4);
        let before = world.chunk((0, 0));

        world.flag(CellTarget::new((0, 0), (1, 1)));
        let after = world.chunk((0, 0));

        assert!(!before.get((1, 1)).unwrap().is_flagged());
        assert!(after.get((1, 1)).unwrap().is_flagged());
    }

    #[test]
    fn chunk_reads_do_not_wait_on_each_other() {
        let world = Arc::new(shared((16, 16), &[(3, 3)], 4));
        world.chunk((0, 0));

        // another reader mid-extraction: holding the world read guard and the cache
        let state = world.state.read();
        let cache = world.cache.lock();

        let (done, finished) = mpsc::channel();
        let reader = Arc::clone(&world);
        let handle = thread::spawn(move || {
            let cached = reader.chunk((0, 0));
            let fresh = reader.chunk((1, 1));
            done.send((cached, fresh)).unwrap();
        });

        let (cached, fresh) = finished
            .recv_timeout(Duration::from_secs(10))
            .expect("chunk read blocked behind another reader");
        assert!(cached.get((3, 3)).unwrap().has_mine());
        assert_eq!(fresh.coord(), (1, 1));

        drop(cache);
        drop(state);
        handle.join().unwrap();
    }

    #[test]
    fn cached_chunk_is_served_until_next_mutation() {
        let world = shared((8, 8), &[(7, 7)], 4);

        let first = world.chunk((0, 0));
        assert_eq!(world.cache.lock().len(), 1);
        assert_eq!(world.chunk((0, 0)), first);

        world.reveal(CellTarget::new((0, 0), (0, 0)));
        assert!(world.chunk((0, 0)).iter().all(Cell::is_revealed));
    }

    #[test]
    fn counts_first_time_users() {
        let world = shared((2, 2), &[], 2);

        assert!(world.note_user("alice"));
        assert!(!world.note_user("alice"));
        assert!(world.note_user("bob"));
        assert_eq!(world.stats().unique_users, 2);
    }

    #[test]
    fn reset_clears_state_but_keeps_counters() {
        let world = shared((4, 4), &[(0, 0)], 2);
        world.reveal(CellTarget::new((0, 0), (0, 0)));
        world.note_user("carol");

        let settings = WorldSettings {
            width: 10,
            height: 10,
            chunk_size: 5,
            mine_density: 0.0,
            seed: Some(1),
            chunk_cache: 4,
        };
        world.reset(&settings).unwrap();

        assert_eq!(world.layout().size(), 5);
        let updates = updates(world.reveal(CellTarget::new((1, 1), (4, 4))));
        assert_eq!(updates.len(), 100);

        let stats = world.stats();
        assert_eq!(stats.exploded_mines, 1);
        assert_eq!(stats.unique_users, 1);
    }

    #[test]
    fn failed_reset_keeps_world() {
        let world = shared((4, 4), &[], 2);
        world.flag(CellTarget::new((0, 0), (1, 1)));

        let settings = WorldSettings {
            mine_density: 2.0,
            ..WorldSettings::default()
        };
        assert!(world.reset(&settings).is_err());
        assert!(world.chunk((0, 0)).get((1, 1)).unwrap().is_flagged());
    }

    #[test]
    fn concurrent_mutations_are_serialized() {
        let world = Arc::new(shared((64, 64), &[], 8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let world = Arc::clone(&world);
                thread::spawn(move || {
                    let mut revealed = 0;
                    for x in 0..8 {
                        let target = CellTarget::new((i, 0), (x, 0));
                        revealed += updates(world.reveal(target)).len();
                        world.chunk((i, 0));
                    }
                    revealed
                })
            })
            .collect();

        let total: usize = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();

        // the first reveal floods the empty world, everything after is a no-op
        assert_eq!(total, 64 * 64);
        assert!(world.chunk((7, 7)).iter().all(Cell::is_revealed));
    }
}
