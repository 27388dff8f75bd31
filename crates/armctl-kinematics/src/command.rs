//! 关键词指令解析
//!
//! 把语音识别 / 聊天得到的短文本映射为预设位置。规则按顺序匹配，先命中者优先：
//!
//! 1. 问候语（`你好`、`hello` ...）：返回 [`CommandError::Greeting`]
//! 2. "移动"类（`动` / `move`）+ 方向词
//! 3. "去"类（`去` / `go to` / `goto`）+ 位置词
//! 4. 简短的方向词（少于 5 个字符，或单个英文单词）
//! 5. 复位词 → `home`
//! 6. 抓取词 → `pickup`
//!
//! 英文关键词不区分大小写，按整词匹配；中文关键词按子串匹配。

use crate::error::CommandError;
use crate::preset::Preset;
use crate::solver::{AnalyticIkSolver, IkSolution};
use serde::Serialize;
use tracing::debug;

const GREETINGS: &[&str] = &["你好", "您好", "hello", "hi", "嗨", "哈喽"];

const MOVE_MARKERS: &[&str] = &["动", "move"];
const GOTO_MARKERS: &[&str] = &["去", "go to", "goto"];

const FORWARD: &[&str] = &["前", "forward"];
const BACK: &[&str] = &["后", "back"];
const LEFT: &[&str] = &["左", "left"];
const RIGHT: &[&str] = &["右", "right"];
const UP: &[&str] = &["上", "up", "高"];
const DOWN: &[&str] = &["下", "down", "低"];
const CENTER: &[&str] = &["中", "center"];
const HIGH: &[&str] = &["高", "up", "high", "上"];

const RESET_WORDS: &[&str] = &["初始", "home", "复位", "归位", "原点", "零点", "回到", "reset"];
const GRASP_WORDS: &[&str] = &["拿", "捡", "抓", "取", "pickup", "grab", "pick"];

/// 短指令字符数上限（不含）
const SHORT_COMMAND_CHARS: usize = 5;

/// "移动"类规则的方向表（顺序即优先级）
const MOVE_TABLE: &[(&[&str], Preset)] = &[
    (FORWARD, Preset::Forward),
    (BACK, Preset::Back),
    (LEFT, Preset::Left),
    (RIGHT, Preset::Right),
    (UP, Preset::High),
    (DOWN, Preset::Pickup),
];

/// 简短方向词表（左右优先于前后）
const SHORT_TABLE: &[(&[&str], Preset)] = &[
    (LEFT, Preset::Left),
    (RIGHT, Preset::Right),
    (FORWARD, Preset::Forward),
    (BACK, Preset::Back),
    (UP, Preset::High),
    (DOWN, Preset::Pickup),
];

/// "去"类规则的位置表
const GOTO_TABLE: &[(&[&str], Preset)] = &[
    (LEFT, Preset::Left),
    (RIGHT, Preset::Right),
    (CENTER, Preset::Center),
    (HIGH, Preset::High),
    (FORWARD, Preset::Forward),
    (BACK, Preset::Back),
];

/// 可识别的指令类别（用于提示）
pub fn available_commands() -> Vec<String> {
    [
        "方向：向前移动/向后移动/向左移动/向右移动/向上移动/向下移动 (move forward/back/left/right/up/down)",
        "位置：去左边/去右边/去中间/去高处 (go to left/right/center/high)",
        "复位：回到初始位置/复位/归位 (home/reset)",
        "抓取：拿/捡/抓/取 (pickup/grab)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 解析结果：预设位置及其关节角度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetMove {
    pub preset: Preset,
    pub solution: IkSolution,
}

/// 英文关键词按整词（或连续词组）匹配，中文关键词按子串匹配
fn contains_word(text: &str, word: &str) -> bool {
    if !word.is_ascii() {
        return text.contains(word);
    }

    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let phrase: Vec<&str> = word.split_whitespace().collect();
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|window| window == phrase.as_slice())
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| contains_word(text, w))
}

fn first_match(text: &str, table: &[(&[&str], Preset)]) -> Option<Preset> {
    table
        .iter()
        .find(|(words, _)| contains_any(text, words))
        .map(|(_, preset)| *preset)
}

fn is_greeting(text: &str) -> bool {
    contains_any(text, GREETINGS)
}

fn is_short(text: &str) -> bool {
    text.chars().count() < SHORT_COMMAND_CHARS
        || (text.is_ascii() && text.split_whitespace().count() == 1)
}

/// 把文本映射为预设位置（不求解）
pub fn interpret(text: &str) -> Result<Preset, CommandError> {
    let text = text.trim();
    let lower = text.to_lowercase();

    if is_greeting(&lower) {
        return Err(CommandError::Greeting {
            available: available_commands(),
        });
    }

    if contains_any(&lower, MOVE_MARKERS)
        && let Some(preset) = first_match(&lower, MOVE_TABLE)
    {
        return Ok(preset);
    }

    if contains_any(&lower, GOTO_MARKERS)
        && let Some(preset) = first_match(&lower, GOTO_TABLE)
    {
        return Ok(preset);
    }

    if is_short(text)
        && let Some(preset) = first_match(&lower, SHORT_TABLE)
    {
        return Ok(preset);
    }

    if contains_any(&lower, RESET_WORDS) {
        return Ok(Preset::Home);
    }

    if contains_any(&lower, GRASP_WORDS) {
        return Ok(Preset::Pickup);
    }

    Err(CommandError::Unrecognized {
        text: text.to_string(),
        available: available_commands(),
    })
}

impl AnalyticIkSolver {
    /// 解析文本指令并求解对应预设位置
    pub fn parse_command(&self, text: &str) -> Result<PresetMove, CommandError> {
        let preset = interpret(text)?;
        debug!("Command {:?} -> preset {}", text, preset);
        let solution = self.solve_preset(preset)?;
        Ok(PresetMove { preset, solution })
    }
}
