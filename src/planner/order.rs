use std::collections::BTreeMap;

use tracing::debug;

use super::module::ModuleConfig;
use super::range::CountRange;
use super::sampler::{Sampler, sample_count, shuffle};

/// 按 `index_group` 分桶、桶内洗牌、按分组配置截取，再按分组升序拼接。
///
/// 桶内保持输入顺序（未洗牌时）；未出现在 `group_settings` 中的分组不做限制，
/// 上限为 0 时整组被丢弃。
pub fn order_modules<S: Sampler + ?Sized>(
    modules: Vec<ModuleConfig>,
    shuffle_modules: bool,
    group_settings: &BTreeMap<u32, CountRange>,
    sampler: &mut S,
) -> Vec<ModuleConfig> {
    let total = modules.len();
    let mut groups: BTreeMap<u32, Vec<ModuleConfig>> = BTreeMap::new();
    for module in modules {
        groups
            .entry(module.base.index_group)
            .or_default()
            .push(module);
    }

    let mut ordered = Vec::with_capacity(total);
    for (index_group, mut bucket) in groups {
        if shuffle_modules && bucket.len() > 1 {
            shuffle(sampler, &mut bucket);
        }

        if let Some(range) = group_settings.get(&index_group) {
            let limit = sample_count(sampler, *range) as usize;
            if limit < bucket.len() {
                debug!(
                    target: "planner::order",
                    index_group,
                    limit,
                    available = bucket.len(),
                    "分组数量超过上限，截取前若干个模块"
                );
                bucket.truncate(limit);
            }
        }

        ordered.extend(bucket);
    }

    ordered
}
