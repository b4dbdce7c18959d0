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

mod destination;
mod fork;
mod transaction;

pub use destination::{Destination, TemplateKind};
pub use fork::{Fork, ForkId, ForkProfile, ForkStatus, ForkType};
pub use transaction::{OutPoint, Transaction, TxOutput, TxType};

/// Tag type for block identifiers.
pub enum Block {}
