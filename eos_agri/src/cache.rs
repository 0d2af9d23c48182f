/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! a single entry cache for expensive aggregations with TTL expiry and single-flight computation.
//!
//! Requests that find no valid entry either start a computation or - if one is already in flight -
//! join it. Computations run as spawned tasks, i.e. they complete and update the cache even if all
//! requesters gave up waiting. Each requester waits until its own [`Deadline`] expires, after which
//! it gets the stale entry (if any) tagged accordingly.
//!
//! Expiry is lazy: entries are checked against the TTL when they are requested, there is no
//! background eviction.

use std::{fmt, future::Future, sync::{Arc, Mutex, MutexGuard}, time::Duration};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::{debug, info, warn};

use eos_common::{datetime::{Clock, duration_since}, deadline::Deadline};
use crate::errors::{EosAgriError, Result};

/// where response data came from
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// valid cache entry
    Cache,
    /// computed for (or while) this request
    Fresh,
    /// expired or invalidated entry, a newer one is not (yet) available
    Stale,
    /// no data available, response carries no or placeholder data
    Fallback
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataSource::Cache => "cache",
            DataSource::Fresh => "fresh",
            DataSource::Stale => "stale",
            DataSource::Fallback => "fallback"
        };
        write!(f, "{s}")
    }
}

pub type SharedError = Arc<EosAgriError>;

#[derive(Debug)]
pub enum CacheOutcome<T> {
    Hit(Arc<T>),
    /// computation started by this request
    Fresh(Arc<T>),
    /// computation that was already in flight when this request arrived
    Joined(Arc<T>),
    /// the request deadline expired before the computation completed
    Pending { stale: Option<Arc<T>> },
    Failed { error: SharedError, stale: Option<Arc<T>> }
}

impl<T> CacheOutcome<T> {
    pub fn source (&self)->DataSource {
        match self {
            CacheOutcome::Hit(_) => DataSource::Cache,
            CacheOutcome::Fresh(_) | CacheOutcome::Joined(_) => DataSource::Fresh,
            CacheOutcome::Pending { stale } | CacheOutcome::Failed { stale, .. } => {
                if stale.is_some() { DataSource::Stale } else { DataSource::Fallback }
            }
        }
    }

    pub fn data (&self)->Option<&Arc<T>> {
        match self {
            CacheOutcome::Hit(v) | CacheOutcome::Fresh(v) | CacheOutcome::Joined(v) => Some(v),
            CacheOutcome::Pending { stale } | CacheOutcome::Failed { stale, .. } => stale.as_ref()
        }
    }

    pub fn error (&self)->Option<&SharedError> {
        if let CacheOutcome::Failed { error, .. } = self { Some(error) } else { None }
    }

    pub fn is_pending (&self)->bool { matches!( self, CacheOutcome::Pending {..}) }
}

type SharedComputation<T> = Shared<BoxFuture<'static, std::result::Result<Arc<T>,SharedError>>>;

struct Entry<T> {
    value: Arc<T>,
    computed_at: DateTime<Utc>,
    invalidated: bool
}

struct Inflight<T> {
    started_at: DateTime<Utc>,
    computation: SharedComputation<T>
}

struct CacheState<T> {
    entry: Option<Entry<T>>,
    inflight: Option<Inflight<T>>,
    generation: u64,
    computations: u64,
    last_error: Option<String>
}

#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub computing: bool,
    pub has_entry: bool,
    pub is_valid: bool,
    #[serde(serialize_with = "eos_common::datetime::ser_epoch_millis_option")]
    pub computed_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "eos_common::datetime::ser_epoch_millis_option")]
    pub computing_since: Option<DateTime<Utc>>,
    pub ttl_secs: u64,
    pub computations: u64,
    #[serde(skip_serializing_if = "eos_common::is_none")]
    pub last_error: Option<String>
}

pub struct AggregationCache<T> {
    state: Arc<Mutex<CacheState<T>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration
}

impl<T> Clone for AggregationCache<T> {
    fn clone (&self)->Self {
        AggregationCache { state: self.state.clone(), clock: self.clock.clone(), ttl: self.ttl }
    }
}

fn lock<T> (state: &Mutex<CacheState<T>>)->MutexGuard<'_,CacheState<T>> {
    // state is only mutated by non-panicking code sections
    state.lock().unwrap_or_else( |poisoned| poisoned.into_inner())
}

impl<T> AggregationCache<T> where T: Send + Sync + 'static {

    pub fn new (clock: Arc<dyn Clock>, ttl: Duration)->Self {
        let state = CacheState { entry: None, inflight: None, generation: 0, computations: 0, last_error: None };
        AggregationCache { state: Arc::new( Mutex::new(state)), clock, ttl }
    }

    pub fn ttl (&self)->Duration { self.ttl }

    fn is_valid (&self, entry: &Entry<T>)->bool {
        !entry.invalidated && duration_since( &self.clock.now(), &entry.computed_at) < self.ttl
    }

    /// the current entry if it has not expired
    pub fn get (&self)->Option<Arc<T>> {
        let st = lock( &self.state);
        st.entry.as_ref().filter( |e| self.is_valid(e)).map( |e| e.value.clone())
    }

    /// the current entry, regardless of expiry
    pub fn stale (&self)->Option<Arc<T>> {
        lock( &self.state).entry.as_ref().map( |e| e.value.clone())
    }

    /// mark the current entry as expired and detach a running computation, whose result is still
    /// delivered to its waiters but will not be stored
    pub fn invalidate (&self) {
        let mut st = lock( &self.state);
        if let Some(entry) = &mut st.entry { entry.invalidated = true }
        st.generation += 1;
        st.inflight = None;
        info!("aggregation cache invalidated");
    }

    pub fn status (&self)->CacheStatus {
        let st = lock( &self.state);
        CacheStatus {
            computing: st.inflight.is_some(),
            has_entry: st.entry.is_some(),
            is_valid: st.entry.as_ref().is_some_and( |e| self.is_valid(e)),
            computed_at: st.entry.as_ref().map( |e| e.computed_at),
            computing_since: st.inflight.as_ref().map( |i| i.started_at),
            ttl_secs: self.ttl.as_secs(),
            computations: st.computations,
            last_error: st.last_error.clone()
        }
    }

    /// return a valid entry, or wait for a (new or already running) computation until `deadline`.
    /// `compute` is only called if there is no valid entry and no computation in flight
    pub async fn get_or_compute<F,Fut> (&self, deadline: &Deadline, compute: F)->CacheOutcome<T>
        where F: FnOnce()->Fut, Fut: Future<Output=Result<T>> + Send + 'static
    {
        let (computation, joined) = {
            let mut st = lock( &self.state);

            if let Some(entry) = &st.entry {
                if self.is_valid(entry) { return CacheOutcome::Hit( entry.value.clone()) }
            }

            if let Some(inflight) = &st.inflight {
                debug!("joining aggregation in flight");
                (inflight.computation.clone(), true)
            } else {
                let computation = self.start_computation( &mut st, compute());
                (computation, false)
            }
        };

        match deadline.run( computation).await {
            Ok(Ok(value)) => if joined { CacheOutcome::Joined(value) } else { CacheOutcome::Fresh(value) },
            Ok(Err(error)) => CacheOutcome::Failed { error, stale: self.stale() },
            Err(expiry) => {
                debug!("aggregation request gave up waiting: {expiry}");
                CacheOutcome::Pending { stale: self.stale() }
            }
        }
    }

    fn start_computation<Fut> (&self, st: &mut CacheState<T>, fut: Fut)->SharedComputation<T>
        where Fut: Future<Output=Result<T>> + Send + 'static
    {
        let generation = st.generation;
        let state = self.state.clone();
        let clock = self.clock.clone();
        st.computations += 1;
        info!("starting aggregation #{}", st.computations);

        let computation: SharedComputation<T> = async move {
            let res = fut.await;

            let mut st = lock( &state);
            let is_current = st.generation == generation;
            if is_current { st.inflight = None }

            match res {
                Ok(value) => {
                    let value = Arc::new(value);
                    if is_current {
                        st.entry = Some( Entry { value: value.clone(), computed_at: clock.now(), invalidated: false });
                        st.last_error = None;
                        info!("aggregation cache updated");
                    }
                    Ok(value)
                }
                Err(e) => {
                    warn!("aggregation failed: {e}");
                    if is_current { st.last_error = Some( e.to_string()) }
                    Err( Arc::new(e))
                }
            }
        }.boxed().shared();

        st.inflight = Some( Inflight { started_at: self.clock.now(), computation: computation.clone() });

        // run to completion even if all requesters give up waiting
        tokio::spawn( computation.clone());
        computation
    }
}
