// crates/gr_referencing/src/identified.rs

//! 可标识对象
//!
//! 所有大地测量对象共有的元数据：名称、别名、权威标识符与备注。
//! 严格比较包含这些元数据，结构比较（忽略元数据）则不包含。

use std::fmt;
use std::sync::Arc;

// ============================================================================
// 标识符与命名空间
// ============================================================================

/// 权威标识符，例如 `EPSG:4326`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// 权威机构
    pub authority: String,
    /// 代码
    pub code: String,
}

impl Identifier {
    /// 创建标识符
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// 命名空间（命名系统）
///
/// 同一作用域字符串只创建一个实例，由权威工厂缓存并跨调用复用。
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NameSpace {
    scope: String,
}

impl NameSpace {
    /// 创建命名空间
    pub fn new(scope: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { scope: scope.into() })
    }

    /// 作用域名称
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// 带作用域的名称（别名）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedName {
    /// 所属命名空间，`None` 表示全局
    pub scope: Option<Arc<NameSpace>>,
    /// 名称
    pub name: String,
}

impl ScopedName {
    /// 创建带作用域的名称
    pub fn new(scope: Option<Arc<NameSpace>>, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(ns) => write!(f, "{}:{}", ns.scope(), self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ============================================================================
// 可标识对象
// ============================================================================

/// 可标识对象的公共元数据
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IdentifiedObject {
    /// 主名称
    pub name: String,
    /// 别名
    pub aliases: Vec<ScopedName>,
    /// 外部标识符
    pub identifiers: Vec<Identifier>,
    /// 备注
    pub remarks: Option<String>,
}

impl IdentifiedObject {
    /// 仅以名称创建
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 以名称和权威代码创建
    pub fn with_code(
        name: impl Into<String>,
        authority: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifiers: vec![Identifier::new(authority, code)],
            ..Self::default()
        }
    }

    /// 追加别名
    #[must_use]
    pub fn with_alias(mut self, alias: ScopedName) -> Self {
        self.aliases.push(alias);
        self
    }

    /// 设置备注
    #[must_use]
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// 指定权威机构下的标识符（忽略大小写）
    pub fn identifier(&self, authority: &str) -> Option<&Identifier> {
        self.identifiers
            .iter()
            .find(|id| id.authority.eq_ignore_ascii_case(authority))
    }

    /// 第一个标识符
    pub fn primary_identifier(&self) -> Option<&Identifier> {
        self.identifiers.first()
    }

    /// 名称或任一别名是否匹配（忽略大小写与首尾空白）
    pub fn name_matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.trim().eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.name.trim().eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// 比较
// ============================================================================

/// 比较模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonMode {
    /// 严格比较，包含名称、别名、标识符与备注
    Strict,
    /// 结构比较，仅比较影响坐标数值的属性
    IgnoreMetadata,
}

/// 支持两种比较模式的对象
pub trait Comparable {
    /// 按给定模式比较
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool;
}

impl Comparable for IdentifiedObject {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        match mode {
            ComparisonMode::Strict => self == other,
            ComparisonMode::IgnoreMetadata => true,
        }
    }
}

/// 比较两个共享对象，同一实例直接返回 `true`
#[inline]
pub fn arc_equals<T: Comparable + ?Sized>(a: &Arc<T>, b: &Arc<T>, mode: ComparisonMode) -> bool {
    Arc::ptr_eq(a, b) || a.equals(b, mode)
}

/// 比较两个可选的共享对象
pub fn option_arc_equals<T: Comparable + ?Sized>(
    a: &Option<Arc<T>>,
    b: &Option<Arc<T>>,
    mode: ComparisonMode,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => arc_equals(a, b, mode),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        let id = Identifier::new("EPSG", "4326");
        assert_eq!(id.to_string(), "EPSG:4326");
    }

    #[test]
    fn test_name_matches_alias() {
        let ns = NameSpace::new("EPSG abbreviation");
        let object = IdentifiedObject::with_code("World Geodetic System 1984", "EPSG", "6326")
            .with_alias(ScopedName::new(Some(ns), "WGS 84"));
        assert!(object.name_matches("wgs 84"));
        assert!(object.name_matches(" World Geodetic System 1984 "));
        assert!(!object.name_matches("NAD27"));
        assert_eq!(object.identifier("epsg").map(|id| id.code.as_str()), Some("6326"));
    }

    #[test]
    fn test_metadata_comparison() {
        let a = IdentifiedObject::named("a").with_remarks("x");
        let b = IdentifiedObject::named("b");
        assert!(!a.equals(&b, ComparisonMode::Strict));
        assert!(a.equals(&b, ComparisonMode::IgnoreMetadata));
    }
}
