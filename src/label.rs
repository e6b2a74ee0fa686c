// 该文件是 Shouyu （手语） 项目的一部分。
// src/label.rs - 手语字母表
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fmt;

/// 空闲状态下显示的占位符号
pub const IDLE_SYMBOL: char = '#';

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  fn from_label_id(id: u32) -> Option<Self>;
}

/// 分类器输出的 21 个静态手语字母，顺序与训练时的类别编号一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Letter {
  A,
  B,
  C,
  D,
  E,
  F,
  G,
  I,
  L,
  M,
  N,
  O,
  P,
  Q,
  R,
  S,
  T,
  U,
  V,
  W,
  Y,
}

impl Letter {
  pub const COUNT: usize = 21;

  pub const ALL: [Letter; Letter::COUNT] = {
    use Letter::*;
    [
      A, B, C, D, E, F, G, I, L, M, N, O, P, Q, R, S, T, U, V, W, Y,
    ]
  };

  pub fn as_char(self) -> char {
    match self {
      Letter::A => 'A',
      Letter::B => 'B',
      Letter::C => 'C',
      Letter::D => 'D',
      Letter::E => 'E',
      Letter::F => 'F',
      Letter::G => 'G',
      Letter::I => 'I',
      Letter::L => 'L',
      Letter::M => 'M',
      Letter::N => 'N',
      Letter::O => 'O',
      Letter::P => 'P',
      Letter::Q => 'Q',
      Letter::R => 'R',
      Letter::S => 'S',
      Letter::T => 'T',
      Letter::U => 'U',
      Letter::V => 'V',
      Letter::W => 'W',
      Letter::Y => 'Y',
    }
  }
}

impl WithLabel for Letter {
  fn to_label_str(&self) -> String {
    self.as_char().to_string()
  }

  fn to_label_id(&self) -> u32 {
    *self as u32
  }

  fn from_label_id(id: u32) -> Option<Self> {
    Letter::ALL.get(id as usize).copied()
  }
}

impl fmt::Display for Letter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_char())
  }
}

/// 画面上显示的标签：某个字母，或表示“尚无可信结果”的空闲状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayedLabel {
  #[default]
  Idle,
  Letter(Letter),
}

impl DisplayedLabel {
  pub fn as_char(self) -> char {
    match self {
      DisplayedLabel::Idle => IDLE_SYMBOL,
      DisplayedLabel::Letter(letter) => letter.as_char(),
    }
  }
}

impl fmt::Display for DisplayedLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_char())
  }
}
