// Copyright (c) 2022 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://spdx.org/licenses/MIT
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Display, panic::Location};

use logging::log;

/// Log the error of a result and pass the result on unchanged.
///
/// Used where a failure must be recorded but must not interrupt the surrounding flow,
/// e.g. while evicting a chain of dependent entries.
pub trait TapLog
where
    Self: Sized,
{
    fn log_err(self) -> Self;
    fn log_err_pfx(self, prefix: &str) -> Self;
    fn log_warn(self) -> Self;
    fn log_warn_pfx(self, prefix: &str) -> Self;
}

const LOG_TARGET: &str = "TapLog";

fn emit(err: &dyn Display, prefix: Option<&str>, level: log::Level, loc: &Location<'_>) {
    match prefix {
        Some(prefix) => log::log!(
            target: LOG_TARGET,
            level,
            "{prefix}: {err} ({}:{})",
            loc.file(),
            loc.line()
        ),
        None => log::log!(
            target: LOG_TARGET,
            level,
            "{err} ({}:{})",
            loc.file(),
            loc.line()
        ),
    }
}

impl<T, E: Display> TapLog for Result<T, E> {
    #[inline(always)]
    #[track_caller]
    fn log_err(self) -> Self {
        if let Err(ref err) = self {
            emit(err, None, log::Level::Error, Location::caller());
        }
        self
    }

    #[inline(always)]
    #[track_caller]
    fn log_err_pfx(self, prefix: &str) -> Self {
        if let Err(ref err) = self {
            emit(err, Some(prefix), log::Level::Error, Location::caller());
        }
        self
    }

    #[inline(always)]
    #[track_caller]
    fn log_warn(self) -> Self {
        if let Err(ref err) = self {
            emit(err, None, log::Level::Warn, Location::caller());
        }
        self
    }

    #[inline(always)]
    #[track_caller]
    fn log_warn_pfx(self, prefix: &str) -> Self {
        if let Err(ref err) = self {
            emit(err, Some(prefix), log::Level::Warn, Location::caller());
        }
        self
    }
}
