//! 选项标记与判断题答案的规范化

use std::sync::OnceLock;

use phf::phf_map;
use regex::Regex;

/// 选择题选项标记，按选项顺序排列
pub const OPTION_MARKERS: [&str; 4] = ["①", "②", "③", "④"];

/// 判断题的两个合法答案
pub const TRUE_MARK: &str = "O";
pub const FALSE_MARK: &str = "X";

static CHOICE_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "①" => 0, "②" => 1, "③" => 2, "④" => 3,
    "1" => 0, "2" => 1, "3" => 2, "4" => 3,
    "A" => 0, "B" => 1, "C" => 2, "D" => 3,
};

static TRUE_FALSE: phf::Map<&'static str, &'static str> = phf_map! {
    "O" => TRUE_MARK, "○" => TRUE_MARK, "TRUE" => TRUE_MARK, "T" => TRUE_MARK,
    "对" => TRUE_MARK, "正确" => TRUE_MARK, "√" => TRUE_MARK,
    "X" => FALSE_MARK, "×" => FALSE_MARK, "FALSE" => FALSE_MARK, "F" => FALSE_MARK,
    "错" => FALSE_MARK, "错误" => FALSE_MARK,
};

/// 去掉 "(B)"、"2." 之类的包裹符号
fn decoration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\s(（\[]*(?P<mark>[^\s.)）\]、]+)[\s.)）\]、]*$").expect("静态正则表达式")
    })
}

fn core_token(raw: &str) -> Option<String> {
    decoration()
        .captures(raw)
        .map(|caps| caps["mark"].to_uppercase())
}

/// 选项标记对应的下标（0..4）
pub fn choice_index(raw: &str) -> Option<usize> {
    core_token(raw).and_then(|token| CHOICE_INDEX.get(token.as_str()).copied())
}

/// 规范化为 ①–④
pub fn normalize_choice(raw: &str) -> Option<&'static str> {
    choice_index(raw).map(|idx| OPTION_MARKERS[idx])
}

/// 规范化为 O / X
pub fn normalize_true_false(raw: &str) -> Option<&'static str> {
    core_token(raw).and_then(|token| TRUE_FALSE.get(token.as_str()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_choice_variants() {
        assert_eq!(normalize_choice("②"), Some("②"));
        assert_eq!(normalize_choice("2"), Some("②"));
        assert_eq!(normalize_choice(" (c) "), Some("③"));
        assert_eq!(normalize_choice("D."), Some("④"));
        assert_eq!(normalize_choice("5"), None);
        assert_eq!(normalize_choice("两个选项"), None);
        assert_eq!(normalize_choice(""), None);
    }

    #[test]
    fn test_normalize_true_false() {
        assert_eq!(normalize_true_false("o"), Some("O"));
        assert_eq!(normalize_true_false("False"), Some("X"));
        assert_eq!(normalize_true_false("对"), Some("O"));
        assert_eq!(normalize_true_false("maybe"), None);
    }

    #[test]
    fn test_choice_index() {
        assert_eq!(choice_index("①"), Some(0));
        assert_eq!(choice_index("4"), Some(3));
    }
}
