use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::range::{CountRange, NumberRange};

/// 规划流程中所有随机抽样的统一入口。
///
/// 每次调用都是独立抽样，实现方不得缓存结果；测试中可以替换为确定性实现。
pub trait Sampler {
    /// 在闭区间 `[min, max]` 内均匀取值；退化区间直接返回端点。
    fn sample_range(&mut self, min: f64, max: f64) -> f64;

    /// 在整数闭区间 `[min, max]` 内均匀取值。
    fn sample_count(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let upper = f64::from(max) + 1.0;
        let value = self.sample_range(f64::from(min), upper).floor();
        (value as u32).clamp(min, max)
    }
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn sample_range(&mut self, min: f64, max: f64) -> f64 {
        (**self).sample_range(min, max)
    }

    fn sample_count(&mut self, min: u32, max: u32) -> u32 {
        (**self).sample_count(min, max)
    }
}

pub fn sample_number<S: Sampler + ?Sized>(sampler: &mut S, range: NumberRange) -> f64 {
    sampler.sample_range(range.min(), range.max())
}

pub fn sample_count<S: Sampler + ?Sized>(sampler: &mut S, range: CountRange) -> u32 {
    sampler.sample_count(range.min(), range.max())
}

/// 从列表中均匀选取一个元素，空列表返回 `None`。
pub fn pick<'a, T, S: Sampler + ?Sized>(sampler: &mut S, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let last = u32::try_from(items.len() - 1).unwrap_or(u32::MAX);
    let index = sampler.sample_count(0, last) as usize;
    items.get(index.min(items.len() - 1))
}

/// Fisher-Yates 洗牌。
pub fn shuffle<T, S: Sampler + ?Sized>(sampler: &mut S, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let bound = u32::try_from(i).unwrap_or(u32::MAX);
        let j = sampler.sample_count(0, bound) as usize;
        items.swap(i, j.min(i));
    }
}

/// 基于 `StdRng` 的默认实现；给定种子时规划结果可复现。
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 有种子时按偏移派生（每个钱包一份），否则使用系统熵。
    pub fn derive(seed: Option<u64>, offset: u64) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed.wrapping_add(offset)),
            None => Self::from_entropy(),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Sampler for RandomSampler {
    fn sample_range(&mut self, min: f64, max: f64) -> f64 {
        if !(max > min) {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}


#[cfg(test)]
mod tests {
    use super::stub::{HighestSampler, ScriptedSampler};
    use super::*;

    #[test]
    fn degenerate_range_returns_endpoint() {
        let mut sampler = RandomSampler::seeded(7);
        for _ in 0..16 {
            assert_eq!(sampler.sample_range(3.5, 3.5), 3.5);
            assert_eq!(sampler.sample_count(4, 4), 4);
            assert_eq!(sampler.sample_count(0, 0), 0);
        }
    }

    #[test]
    fn integer_sampling_stays_within_bounds() {
        let mut sampler = RandomSampler::seeded(42);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let value = sampler.sample_count(1, 4);
            assert!((1..=4).contains(&value));
            seen[(value - 1) as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit), "every value must be reachable");
    }

    #[test]
    fn upper_endpoint_is_clamped_in_integer_mode() {
        let mut sampler = HighestSampler;
        assert_eq!(sampler.sample_count(2, 5), 5);
    }

    #[test]
    fn seeded_samplers_repeat_sequences() {
        let mut a = RandomSampler::seeded(99);
        let mut b = RandomSampler::seeded(99);
        let left: Vec<u32> = (0..10).map(|_| a.sample_count(0, 100)).collect();
        let right: Vec<u32> = (0..10).map(|_| b.sample_count(0, 100)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn pick_uses_sampler_index() {
        let items = ["USDC", "USDT", "DAI"];
        let mut sampler = ScriptedSampler::new([0.99]);
        assert_eq!(pick(&mut sampler, &items), Some(&"DAI"));
        let empty: [&str; 0] = [];
        assert_eq!(pick(&mut sampler, &empty), None);
    }

    #[test]
    fn shuffle_with_lowest_sampler_is_a_rotation() {
        let mut items = vec![1, 2, 3, 4];
        shuffle(&mut ScriptedSampler::lowest(), &mut items);
        // j 恒为 0：依次交换 (3,0) (2,0) (1,0)
        assert_eq!(items, vec![2, 3, 4, 1]);
    }
}
