use std::sync::Arc;

use crate::cache::{RankCache, WarmState};
use crate::leaderboard::{LeaderboardService, UserService};
use crate::pipeline::UpdatePipeline;
use crate::store::ScoreStore;
use crate::sync::CacheSynchronizer;

#[derive(Clone)]
pub struct HandlerState<
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
> {
    pub leaderboard: LeaderboardService<S, C>,

    pub users: UserService<S, C>,

    pub pipeline: Arc<UpdatePipeline<S, C>>,

    pub synchronizer: Arc<CacheSynchronizer<S, C>>,

    pub store: S,

    pub cache: Option<C>,

    pub warm: WarmState,
}

impl<S, C> HandlerState<S, C>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    /// Builds the query services over the same store, cache and warm flag that the
    /// pipeline and synchronizer were given.
    pub fn new(
        store: S,
        cache: Option<C>,
        warm: WarmState,
        pipeline: Arc<UpdatePipeline<S, C>>,
        synchronizer: Arc<CacheSynchronizer<S, C>>,
    ) -> Self {
        Self {
            leaderboard: LeaderboardService::new(store.clone(), cache.clone(), warm.clone()),
            users: UserService::new(store.clone(), cache.clone(), warm.clone()),
            pipeline,
            synchronizer,
            store,
            cache,
            warm,
        }
    }
}
