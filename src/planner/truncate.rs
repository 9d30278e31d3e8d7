use tracing::debug;

use super::module::ModuleConfig;
use super::range::CountRange;
use super::sampler::{Sampler, sample_count};

/// 按 `count_modules` 截断整条计划；恰好为 `[0, 0]` 时不截断。
pub fn truncate_plan<S: Sampler + ?Sized>(
    mut modules: Vec<ModuleConfig>,
    count_modules: CountRange,
    sampler: &mut S,
) -> Vec<ModuleConfig> {
    if count_modules.is_disabled() {
        return modules;
    }

    let cap = sample_count(sampler, count_modules) as usize;
    if cap < modules.len() {
        debug!(
            target: "planner::truncate",
            cap,
            planned = modules.len(),
            "模块数量超过路线上限，丢弃末尾模块"
        );
        modules.truncate(cap);
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::merge::merge_modules;
    use crate::planner::route::{DefaultModuleConfigs, RouteModule};
    use crate::planner::sampler::stub::{HighestSampler, ScriptedSampler};

    fn plan(len: usize) -> Vec<ModuleConfig> {
        let route: Vec<RouteModule> = (0..len)
            .map(|idx| {
                serde_yaml::from_str(&format!(
                    "module_name: step-{idx}\ncount: [1, 1]\nindex_group: 0\n"
                ))
                .unwrap()
            })
            .collect();
        merge_modules(&route, &DefaultModuleConfigs::default()).unwrap()
    }

    #[test]
    fn zero_sentinel_never_shortens() {
        let output = truncate_plan(plan(5), CountRange::fixed(0), &mut HighestSampler);
        assert_eq!(output.len(), 5);
    }

    #[test]
    fn fixed_cap_keeps_prefix() {
        let input = plan(5);
        let expected: Vec<_> = input[..3].to_vec();
        let output = truncate_plan(input, CountRange::fixed(3), &mut ScriptedSampler::lowest());
        assert_eq!(output, expected);
    }

    #[test]
    fn zero_containing_range_still_truncates() {
        let range = CountRange::new(0, 2).unwrap();
        let output = truncate_plan(plan(4), range, &mut ScriptedSampler::new([0.0]));
        assert!(output.is_empty());
    }

    #[test]
    fn cap_above_length_is_a_no_op() {
        let output = truncate_plan(plan(2), CountRange::fixed(10), &mut HighestSampler);
        assert_eq!(output.len(), 2);
    }
}
