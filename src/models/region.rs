//! 选区几何类型
//!
//! 所有坐标均为模板（全局）像素坐标，与显示缩放无关

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 模板像素坐标系中的一个点
///
/// 序列化为 `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    /// 与另一点的欧氏距离的平方
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = (self.0 - other.0) as f64;
        let dy = (self.1 - other.1) as f64;
        dx * dx + dy * dy
    }

    /// 按偏移量平移
    pub fn translated(&self, dx: i32, dy: i32) -> Point {
        Point(self.0 + dx, self.1 + dy)
    }
}

/// 轴对齐矩形选区
///
/// 一旦确认即不可变，`w`、`h` 恒为非负
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// 是否退化选区（宽或高为 0）
    ///
    /// 退化选区在进入划分分类之前就会被拒绝
    pub fn is_degenerate(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// `other` 是否完整落在 `self` 内部（允许边界重合）
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }

    /// 选区左上角，即局部坐标的原点
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

// 配置文件中的选区形如 [x, y, w, h]，按位置序列化
impl Serialize for Region {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&self.x)?;
        tup.serialize_element(&self.y)?;
        tup.serialize_element(&self.w)?;
        tup.serialize_element(&self.h)?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RegionVisitor;

        impl<'de> Visitor<'de> for RegionVisitor {
            type Value = Region;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [x, y, w, h] array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Region, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let y = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                let w = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(2, &self))?;
                let h = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(3, &self))?;
                if seq.next_element::<i32>()?.is_some() {
                    return Err(serde::de::Error::invalid_length(5, &self));
                }
                let region = Region::new(x, y, w, h);
                if region.w < 0 || region.h < 0 {
                    return Err(serde::de::Error::custom("region width/height must be non-negative"));
                }
                Ok(region)
            }
        }

        deserializer.deserialize_tuple(4, RegionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_accepts_inner_rectangle() {
        let outer = Region::new(10, 10, 100, 50);
        let inner = Region::new(20, 15, 30, 20);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn contains_allows_shared_border() {
        let outer = Region::new(0, 0, 10, 10);
        let edge = Region::new(0, 0, 10, 5);
        assert!(outer.contains(&edge));
    }

    #[test]
    fn contains_rejects_overlap() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(5, 5, 10, 10);
        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
    }

    // 相互包含 ⇒ 两矩形相等
    #[test]
    fn mutual_containment_implies_equality() {
        let a = Region::new(3, 4, 20, 30);
        let b = Region::new(3, 4, 20, 30);
        assert!(a.contains(&b) && b.contains(&a));
        assert_eq!(a, b);

        let c = Region::new(3, 4, 20, 31);
        assert!(!(a.contains(&c) && c.contains(&a)));
    }

    #[test]
    fn degenerate_region_detected() {
        assert!(Region::new(0, 0, 0, 10).is_degenerate());
        assert!(Region::new(0, 0, 10, 0).is_degenerate());
        assert!(!Region::new(0, 0, 1, 1).is_degenerate());
    }

    #[test]
    fn region_round_trips_as_positional_array() {
        let r = Region::new(1, 2, 3, 4);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn region_rejects_wrong_arity() {
        assert!(serde_json::from_str::<Region>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<Region>("[1,2,3,4,5]").is_err());
    }

    #[test]
    fn point_translation() {
        assert_eq!(Point(2, 3).translated(100, 100), Point(102, 103));
    }
}
