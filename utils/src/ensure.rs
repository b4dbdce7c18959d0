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

//! Early exit from a function unless a condition holds.

/// Early exit if given condition is not satisfied.
///
/// * `ensure!(cond)` returns [`None`] from the enclosing function if `cond` is false
/// * `ensure!(cond, err)` returns [`Err`]`(err)` from the enclosing function if `cond` is false
///
/// The error expression is only evaluated when the check fails.
///
/// ```
/// # use utils::ensure;
/// # #[derive(PartialEq, Eq, Debug)]
/// enum SpendError {
///     NoInputs,
///     FeeAboveAmount,
/// }
///
/// fn change(inputs: &[u64], amount: u64, fee: u64) -> Result<u64, SpendError> {
///     ensure!(!inputs.is_empty(), SpendError::NoInputs);
///     let value_in: u64 = inputs.iter().sum();
///     ensure!(value_in >= amount + fee, SpendError::FeeAboveAmount);
///     Ok(value_in - amount - fee)
/// }
///
/// assert_eq!(change(&[10, 5], 12, 1), Ok(2));
/// assert_eq!(change(&[], 1, 0), Err(SpendError::NoInputs));
/// assert_eq!(change(&[3], 3, 1), Err(SpendError::FeeAboveAmount));
///
/// fn first_free(used: &[bool]) -> Option<usize> {
///     let pos = used.iter().position(|u| !u);
///     ensure!(pos.is_some());
///     pos
/// }
///
/// assert_eq!(first_free(&[true, false]), Some(1));
/// assert_eq!(first_free(&[true]), None);
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr $(,)?) => {
        $cond.then(|| ())?
    };
    ($cond:expr, $err:expr $(,)?) => {
        $cond.then(|| ()).ok_or_else(|| $err)?
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug, PartialEq, Eq)]
    struct Exhausted(u64);

    fn next_below(label: u64, floor: u64) -> Result<u64, Exhausted> {
        ensure!(label > floor + 1, Exhausted(label));
        Ok(label - 1)
    }

    #[test]
    fn error_evaluated_only_on_failure() {
        assert_eq!(next_below(10, 0), Ok(9));
        assert_eq!(next_below(1, 0), Err(Exhausted(1)));
    }
}
