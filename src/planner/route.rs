use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::kind::ModuleKind;
use super::overrides::ModuleOverrides;
use super::range::CountRange;

/// 路线中的单个模块条目：模块名加任意覆盖字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteModule {
    #[serde(alias = "moduleName")]
    pub module_name: ModuleKind,
    #[serde(flatten)]
    pub overrides: ModuleOverrides,
}

impl RouteModule {
    pub fn new(module_name: ModuleKind) -> Self {
        Self {
            module_name,
            overrides: ModuleOverrides::default(),
        }
    }

    pub fn with_overrides(module_name: ModuleKind, overrides: ModuleOverrides) -> Self {
        Self {
            module_name,
            overrides,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    #[serde(default)]
    pub modules: Vec<RouteModule>,
    /// `index_group -> 执行数量区间`，未配置的分组不做限制。
    #[serde(default, alias = "groupSettings")]
    pub group_settings: BTreeMap<u32, CountRange>,
    /// 整条路线的模块数上限；`[0, 0]` 表示不限制。
    #[serde(default, alias = "countModules")]
    pub count_modules: CountRange,
    #[serde(default, alias = "splitModuleCount")]
    pub split_module_count: bool,
}

/// 各模块类型的默认配置，运行期间只读。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultModuleConfigs {
    entries: BTreeMap<ModuleKind, ModuleOverrides>,
}

impl DefaultModuleConfigs {
    pub fn new(entries: BTreeMap<ModuleKind, ModuleOverrides>) -> Self {
        Self { entries }
    }

    /// 未知模块返回空默认值而不是错误。
    pub fn get(&self, kind: &ModuleKind) -> ModuleOverrides {
        self.entries.get(kind).cloned().unwrap_or_default()
    }

    pub fn contains(&self, kind: &ModuleKind) -> bool {
        self.entries.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ModuleKind> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 以 `other` 中的条目逐字段覆盖当前默认值。
    pub fn layered(mut self, other: DefaultModuleConfigs) -> Self {
        for (kind, overrides) in other.entries {
            let merged = match self.entries.remove(&kind) {
                Some(base) => base.overlay(overrides),
                None => overrides,
            };
            self.entries.insert(kind, merged);
        }
        self
    }
}
