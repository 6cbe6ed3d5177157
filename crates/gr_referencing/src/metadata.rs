// crates/gr_referencing/src/metadata.rs

//! 静态元数据描述表
//!
//! 每种实体类型声明一张 `(属性名, 访问器)` 表，编译期确定，
//! 供命令行工具和诊断输出逐项列出对象属性。

/// 单个属性描述
pub struct PropertyDescriptor<T> {
    /// 属性名
    pub name: &'static str,
    /// 访问器，值缺失时返回 `None`
    pub get: fn(&T) -> Option<String>,
}

/// 可列出元数据的实体
pub trait Describe: Sized + 'static {
    /// 实体类型名
    const KIND: &'static str;

    /// 属性表
    const PROPERTIES: &'static [PropertyDescriptor<Self>];

    /// 列出全部有值的属性
    fn describe(&self) -> Vec<(&'static str, String)> {
        Self::PROPERTIES
            .iter()
            .filter_map(|p| (p.get)(self).map(|value| (p.name, value)))
            .collect()
    }

    /// 按名称读取单个属性
    fn property(&self, name: &str) -> Option<String> {
        Self::PROPERTIES
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| (p.get)(self))
    }
}

/// 格式化浮点属性
pub(crate) fn number(value: f64) -> Option<String> {
    if value.is_nan() {
        None
    } else {
        Some(format!("{value}"))
    }
}

/// 拼接标识符列表
pub(crate) fn identifiers(object: &crate::identified::IdentifiedObject) -> Option<String> {
    if object.identifiers.is_empty() {
        return None;
    }
    Some(
        object
            .identifiers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// 拼接别名列表
pub(crate) fn aliases(object: &crate::identified::IdentifiedObject) -> Option<String> {
    if object.aliases.is_empty() {
        return None;
    }
    Some(
        object
            .aliases
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}
