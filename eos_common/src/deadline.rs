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

//! deadlines that can be passed down a chain of async operations (listing -> download -> parse).
//! A `Deadline` combines an optional point in time with a cancellation token. Derived (child)
//! deadlines can only be tighter than their parent, and cancelling a parent cancels all children.

use std::{fmt, future::Future, time::Duration};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Expiry {
    TimedOut,
    Cancelled
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::TimedOut => write!(f, "deadline exceeded"),
            Expiry::Cancelled => write!(f, "cancelled")
        }
    }
}

#[derive(Debug,Clone)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: CancellationToken
}

impl Deadline {
    pub fn never ()->Self {
        Deadline { at: None, cancel: CancellationToken::new() }
    }

    pub fn after (dur: Duration)->Self {
        Deadline { at: Some(Instant::now() + dur), cancel: CancellationToken::new() }
    }

    pub fn at (instant: Instant)->Self {
        Deadline { at: Some(instant), cancel: CancellationToken::new() }
    }

    /// use an externally owned token, e.g. one that is cancelled on server shutdown
    pub fn with_token (mut self, cancel: CancellationToken)->Self {
        self.cancel = cancel;
        self
    }

    pub fn instant (&self)->Option<Instant> { self.at }

    pub fn remaining (&self)->Option<Duration> {
        self.at.map( |at| at.saturating_duration_since( Instant::now()))
    }

    pub fn cancel (&self) { self.cancel.cancel() }

    pub fn is_expired (&self)->bool {
        self.cancel.is_cancelled() || self.at.is_some_and( |at| at <= Instant::now())
    }

    /// derive a deadline that expires at the earlier of our own instant and `now + limit`
    pub fn child (&self, limit: Option<Duration>)->Deadline {
        let limit_at = limit.map( |dur| Instant::now() + dur);
        let at = match (self.at, limit_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b)
        };
        Deadline { at, cancel: self.cancel.child_token() }
    }

    /// race `fut` against this deadline. Note the future is dropped if the deadline wins
    pub async fn run<F: Future> (&self, fut: F)->Result<F::Output,Expiry> {
        if self.cancel.is_cancelled() { return Err(Expiry::Cancelled) }

        match self.at {
            Some(at) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(Expiry::Cancelled),
                _ = sleep_until(at) => Err(Expiry::TimedOut),
                res = fut => Ok(res)
            },
            None => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(Expiry::Cancelled),
                res = fut => Ok(res)
            }
        }
    }
}

impl Default for Deadline {
    fn default()->Self { Deadline::never() }
}
