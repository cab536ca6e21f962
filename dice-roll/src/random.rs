/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use rand::{distributions::Uniform, rngs::ThreadRng, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Source of the uniformly distributed integers every die is built from.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]`, both inclusive. Callers guarantee `lo <= hi`.
    fn uniform(&mut self, lo: i64, hi: i64) -> i64;
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        RngSource { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.sample(Uniform::new_inclusive(lo, hi))
    }
}

/// Deterministic source, the same seed always produces the same rolls.
pub fn seeded(seed: u64) -> RngSource<Xoshiro256PlusPlus> {
    RngSource::new(Xoshiro256PlusPlus::seed_from_u64(seed))
}

/// Source backed by the generator local to the calling thread.
pub fn thread_source() -> RngSource<ThreadRng> {
    RngSource::new(rand::thread_rng())
}

/// Replays a fixed list of values, starting over once it runs out.
///
/// Values are clamped into the requested range, an empty script always yields `lo`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: Vec<i64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = i64>>(values: I) -> Self {
        ScriptedSource {
            values: values.into_iter().collect(),
            next: 0,
        }
    }

    /// Number of values handed out so far.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, lo: i64, hi: i64) -> i64 {
        if self.values.is_empty() {
            return lo;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value.max(lo).min(hi)
    }
}
