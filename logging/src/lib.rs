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

pub use log;

/// Filter applied when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

static INITIALIZE_LOGGER_ONCE_FLAG: std::sync::Once = std::sync::Once::new();

/// Install the terminal logger. Only the first call has any effect.
pub fn init_logging() {
    init_logging_with_filter(DEFAULT_LOG_FILTER)
}

/// Same as [init_logging], with a custom fallback filter, e.g. `"txpool=trace"`.
pub fn init_logging_with_filter(default_filter: &str) {
    INITIALIZE_LOGGER_ONCE_FLAG.call_once(|| {
        let env = env_logger::Env::default().default_filter_or(default_filter);
        // Another logger may already be installed by the embedding binary
        let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
    });
}
