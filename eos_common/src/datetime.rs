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

use std::{sync::Mutex, time::Duration};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use parse_duration::parse;

#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }
#[inline] pub fn minutes (n: u64)->Duration { Duration::from_secs(n * 60) }

/// source of "now". Time dependent components get this injected so that tests can control time
pub trait Clock: Send + Sync {
    fn now (&self)->DateTime<Utc>;
}

#[derive(Debug,Default,Clone,Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now (&self)->DateTime<Utc> { Utc::now() }
}

/// a clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>
}

impl ManualClock {
    pub fn new (start: DateTime<Utc>)->Self {
        ManualClock { now: Mutex::new(start) }
    }

    pub fn set (&self, dt: DateTime<Utc>) {
        *self.now.lock().unwrap() = dt;
    }

    pub fn advance (&self, dur: Duration) {
        if let Ok(delta) = TimeDelta::from_std(dur) {
            let mut now = self.now.lock().unwrap();
            *now = *now + delta;
        }
    }
}

impl Clock for ManualClock {
    fn now (&self)->DateTime<Utc> { *self.now.lock().unwrap() }
}

/// time elapsed between two dates, zero if `dt_later` is not later than `dt_earlier`
pub fn duration_since (dt_later: &DateTime<Utc>, dt_earlier: &DateTime<Utc>)->Duration {
    (*dt_later - *dt_earlier).to_std().unwrap_or(Duration::ZERO)
}

pub fn ser_epoch_millis<S: Serializer> (dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>  {
    s.serialize_i64(dt.timestamp_millis())
}

pub fn ser_epoch_millis_option<S: Serializer> (opt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>  {
    if let Some(dt) = opt {
        s.serialize_i64(dt.timestamp_millis())
    } else {
        s.serialize_none()
    }
}

/// deserialize human readable duration specs such as "30min" or "45s"
pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}
