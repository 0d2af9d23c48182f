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

use std::{sync::{Arc, atomic::{AtomicUsize, Ordering}}, time::Duration};
use chrono::{TimeZone, Utc};
use futures::future::join_all;

use eos_common::{datetime::{Clock, ManualClock, millis, minutes, secs}, deadline::Deadline};
use eos_agri::{EosAgriError, cache::{AggregationCache, CacheOutcome, DataSource}};

// run with "cargo test -p eos_agri --test test_cache -- --nocapture"

fn manual_clock ()->Arc<ManualClock> {
    Arc::new( ManualClock::new( Utc.with_ymd_and_hms( 2024, 6, 1, 8, 0, 0).unwrap()))
}

fn new_cache (clock: &Arc<ManualClock>)->AggregationCache<Vec<String>> {
    let clock: Arc<dyn Clock> = clock.clone();
    AggregationCache::new( clock, minutes(30))
}

/// computation that counts its invocations and takes `delay` to complete
fn counted (count: &Arc<AtomicUsize>, delay: Duration)->impl FnOnce()->futures::future::BoxFuture<'static,eos_agri::Result<Vec<String>>> {
    let count = count.clone();
    move || {
        Box::pin( async move {
            let n = count.fetch_add( 1, Ordering::SeqCst) + 1;
            tokio::time::sleep( delay).await;
            Ok( vec![ format!("run-{n}") ])
        })
    }
}

fn failing ()->impl FnOnce()->futures::future::BoxFuture<'static,eos_agri::Result<Vec<String>>> {
    || Box::pin( async { Err( EosAgriError::OpFailedError("bucket unavailable".to_string())) })
}

#[tokio::test]
async fn test_ttl_expiry() {
    let clock = manual_clock();
    let cache = new_cache( &clock);
    let count = Arc::new( AtomicUsize::new(0));
    let deadline = Deadline::after( secs(5));

    let first = cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    assert!( matches!( first, CacheOutcome::Fresh(_)));
    assert_eq!( first.source(), DataSource::Fresh);

    clock.advance( minutes(29));
    let second = cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    assert!( matches!( second, CacheOutcome::Hit(_)));
    assert_eq!( second.source(), DataSource::Cache);
    assert_eq!( count.load( Ordering::SeqCst), 1);

    // back-to-back responses within the TTL are identical
    let a = serde_json::to_string( first.data().unwrap().as_ref()).unwrap();
    let b = serde_json::to_string( second.data().unwrap().as_ref()).unwrap();
    assert_eq!( a, b);

    clock.advance( minutes(2));
    assert!( cache.get().is_none());
    assert!( cache.stale().is_some());

    let third = cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    assert!( matches!( third, CacheOutcome::Fresh(_)));
    assert_eq!( third.data().unwrap()[0], "run-2");
    assert_eq!( count.load( Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_flight() {
    let clock = manual_clock();
    let cache = new_cache( &clock);
    let count = Arc::new( AtomicUsize::new(0));
    let deadline = Deadline::after( secs(5));

    let requests = (0..10).map( |_| cache.get_or_compute( &deadline, counted( &count, millis(100))));
    let outcomes = join_all( requests).await;

    assert_eq!( count.load( Ordering::SeqCst), 1);
    assert_eq!( outcomes.iter().filter( |o| matches!( o, CacheOutcome::Fresh(_))).count(), 1);
    assert_eq!( outcomes.iter().filter( |o| matches!( o, CacheOutcome::Joined(_))).count(), 9);

    let first = outcomes[0].data().unwrap();
    for o in &outcomes {
        assert!( Arc::ptr_eq( o.data().unwrap(), first));
        assert_eq!( o.source(), DataSource::Fresh);
    }

    let status = cache.status();
    assert!( !status.computing);
    assert!( status.is_valid);
    assert_eq!( status.computations, 1);
}

#[tokio::test]
async fn test_impatient_callers() {
    let clock = manual_clock();
    let cache = new_cache( &clock);
    let count = Arc::new( AtomicUsize::new(0));

    // nothing cached yet -> fallback
    let outcome = cache.get_or_compute( &Deadline::after( millis(10)), counted( &count, millis(300))).await;
    assert!( outcome.is_pending());
    assert!( outcome.data().is_none());
    assert_eq!( outcome.source(), DataSource::Fallback);
    assert!( cache.status().computing);

    // the computation continues and a patient caller joins it
    let outcome = cache.get_or_compute( &Deadline::after( secs(5)), counted( &count, millis(300))).await;
    assert!( matches!( outcome, CacheOutcome::Joined(_)));
    assert_eq!( count.load( Ordering::SeqCst), 1);

    // expired entry and slow recomputation -> stale data
    clock.advance( minutes(31));
    let outcome = cache.get_or_compute( &Deadline::after( millis(10)), counted( &count, millis(300))).await;
    assert_eq!( outcome.source(), DataSource::Stale);
    assert_eq!( outcome.data().unwrap()[0], "run-1");
    assert_eq!( count.load( Ordering::SeqCst), 2);

    // abandoned computations still update the cache
    tokio::time::sleep( millis(500)).await;
    assert_eq!( cache.get().unwrap()[0], "run-2");
}

#[tokio::test]
async fn test_failed_computation() {
    let clock = manual_clock();
    let cache = new_cache( &clock);
    let count = Arc::new( AtomicUsize::new(0));
    let deadline = Deadline::after( secs(5));

    let outcome = cache.get_or_compute( &deadline, failing()).await;
    assert!( outcome.error().is_some());
    assert_eq!( outcome.source(), DataSource::Fallback);
    assert!( cache.stale().is_none());
    assert!( cache.status().last_error.unwrap().contains("bucket unavailable"));

    // failures are not cached
    let outcome = cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    assert!( matches!( outcome, CacheOutcome::Fresh(_)));
    assert!( cache.status().last_error.is_none());

    // a failing recomputation keeps the old entry
    clock.advance( minutes(45));
    let outcome = cache.get_or_compute( &deadline, failing()).await;
    assert!( outcome.error().is_some());
    assert_eq!( outcome.source(), DataSource::Stale);
    assert_eq!( outcome.data().unwrap()[0], "run-1");
}

#[tokio::test]
async fn test_invalidate() {
    let clock = manual_clock();
    let cache = new_cache( &clock);
    let count = Arc::new( AtomicUsize::new(0));
    let deadline = Deadline::after( secs(5));

    cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    cache.invalidate();

    let status = cache.status();
    assert!( status.has_entry);
    assert!( !status.is_valid);

    let outcome = cache.get_or_compute( &deadline, counted( &count, millis(1))).await;
    assert!( matches!( outcome, CacheOutcome::Fresh(_)));
    assert_eq!( count.load( Ordering::SeqCst), 2);
    assert!( cache.status().is_valid);
}
