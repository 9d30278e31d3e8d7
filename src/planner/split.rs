use tracing::debug;

use super::module::ModuleConfig;
use super::range::CountRange;
use super::sampler::{Sampler, sample_count};

/// 将每个模块按抽取到的次数 N 拆成 N 个 `count = [1, 1]` 的副本。
///
/// 每个模块独立抽取一次；副本连续排列并保持原有顺序；N 为 0 时该模块被移除。
pub fn split_module_count<S: Sampler + ?Sized>(
    modules: Vec<ModuleConfig>,
    sampler: &mut S,
) -> Vec<ModuleConfig> {
    let mut split = Vec::with_capacity(modules.len());

    for module in modules {
        let original = module.count;
        let copies = sample_count(sampler, original);
        if copies == 0 {
            debug!(
                target: "planner::split",
                module = %module.module_name,
                count = %original,
                "抽取次数为 0，跳过该模块"
            );
            continue;
        }

        for _ in 0..copies {
            let mut copy = module.clone();
            copy.count = CountRange::once();
            copy.original_count = Some(original);
            split.push(copy);
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::kind::ModuleKind;
    use crate::planner::merge::merge_modules;
    use crate::planner::route::{DefaultModuleConfigs, RouteModule};
    use crate::planner::sampler::stub::ScriptedSampler;

    fn modules(yaml: &str) -> Vec<ModuleConfig> {
        let route: Vec<RouteModule> = serde_yaml::from_str(yaml).unwrap();
        merge_modules(&route, &DefaultModuleConfigs::default()).unwrap()
    }

    #[test]
    fn fixed_count_yields_exact_copies() {
        let input = modules(
            "- module_name: sync-swap\n  count: [3, 3]\n  index_group: 0\n\
             - module_name: okx-withdraw\n  count: [1, 1]\n  index_group: 0\n",
        );
        let output = split_module_count(input, &mut ScriptedSampler::lowest());

        assert_eq!(output.len(), 4);
        for module in &output[..3] {
            assert_eq!(module.module_name, ModuleKind::SyncSwap);
            assert_eq!(module.count, CountRange::once());
            assert_eq!(module.original_count, Some(CountRange::fixed(3)));
        }
        assert_eq!(output[3].module_name, ModuleKind::OkxWithdraw);
    }

    #[test]
    fn zero_draw_removes_module() {
        let input = modules(
            "- module_name: sync-swap\n  count: [0, 2]\n  index_group: 0\n\
             - module_name: okx-withdraw\n  count: [1, 1]\n  index_group: 0\n",
        );
        // 第一次抽样落在下界 0
        let output = split_module_count(input, &mut ScriptedSampler::new([0.0]));
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].module_name, ModuleKind::OkxWithdraw);
    }

    #[test]
    fn draws_are_independent_per_module() {
        let input = modules(
            "- module_name: sync-swap\n  count: [1, 3]\n  index_group: 0\n\
             - module_name: izumi-swap\n  count: [1, 3]\n  index_group: 0\n",
        );
        // [1, 4) 区间：0.0 -> 1，0.99 -> 3
        let mut sampler = ScriptedSampler::new([0.0, 0.99]);
        let output = split_module_count(input, &mut sampler);
        assert_eq!(sampler.calls, 2);
        let swaps = output
            .iter()
            .filter(|m| m.module_name == ModuleKind::SyncSwap)
            .count();
        let izumi = output
            .iter()
            .filter(|m| m.module_name == ModuleKind::IzumiSwap)
            .count();
        assert_eq!((swaps, izumi), (1, 3));
    }
}
