use crate::calc_engine::{format_number, Operation};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ur,
}

/// Fixed interface strings, looked up per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    Title,
    Subtitle,
    EnterExpression,
    Placeholder,
    Calculate,
    Result,
    Expression,
    InvalidExpression,
    Examples,
    NumberLine,
    Steps,
    Watching,
    ResultMarked,
    SolvePrompt,
    Divergence,
    LanguageName,
    Scale,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ur => "ur",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Ur,
            Language::Ur => Language::En,
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Language::Ur
    }

    pub fn text(self, key: Text) -> &'static str {
        match self {
            Language::En => english(key),
            Language::Ur => urdu(key),
        }
    }

    pub fn describe_start(self, value: f64) -> String {
        let value = format_number(value);
        match self {
            Language::En => format!("Start: {}", value),
            Language::Ur => format!("شروع: {}", value),
        }
    }

    pub fn describe_operation(self, op: Operation, value: f64, position: f64) -> String {
        let v = format_number(value);
        let phrase = match (self, op) {
            (_, Operation::Start) => return self.describe_start(value),
            (Language::En, Operation::Add) => format!("Add {}", v),
            (Language::En, Operation::Subtract) => format!("Subtract {}", v),
            (Language::En, Operation::Multiply) => format!("Multiply by {}", v),
            (Language::En, Operation::Divide) => format!("Divide by {}", v),
            (Language::Ur, Operation::Add) => format!("{} جمع کریں", v),
            (Language::Ur, Operation::Subtract) => format!("{} منہا کریں", v),
            (Language::Ur, Operation::Multiply) => format!("{} سے ضرب دیں", v),
            (Language::Ur, Operation::Divide) => format!("{} سے تقسیم کریں", v),
        };
        format!("{} → {}", phrase, format_number(position))
    }
}

fn english(key: Text) -> &'static str {
    match key {
        Text::Title => "Arithmetic Calculator",
        Text::Subtitle => "Enter any arithmetic expression and see the solution visualized on a number line.",
        Text::EnterExpression => "Enter Expression",
        Text::Placeholder => "e.g., 5 + 3",
        Text::Calculate => "Calculate",
        Text::Result => "Result",
        Text::Expression => "Expression",
        Text::InvalidExpression => "Invalid expression",
        Text::Examples => "Examples",
        Text::NumberLine => "Number Line",
        Text::Steps => "Steps",
        Text::Watching => "Watch the calculation visualized step by step",
        Text::ResultMarked => "The result is marked on the number line above",
        Text::SolvePrompt => "Solve an expression to see the number line",
        Text::Divergence => "Steps run left to right; the result follows operator precedence.",
        Text::LanguageName => "English",
        Text::Scale => "Scale",
    }
}

fn urdu(key: Text) -> &'static str {
    match key {
        Text::Title => "ریاضیاتی کیلکولیٹر",
        Text::Subtitle => "کوئی بھی ریاضیاتی اظہار درج کریں اور نمبر لائن پر حل دیکھیں۔",
        Text::EnterExpression => "اظہار درج کریں",
        Text::Placeholder => "مثال: 5 + 3",
        Text::Calculate => "حل کریں",
        Text::Result => "نتیجہ",
        Text::Expression => "اظہار",
        Text::InvalidExpression => "غلط اظہار",
        Text::Examples => "مثالیں",
        Text::NumberLine => "نمبر لائن",
        Text::Steps => "مراحل",
        Text::Watching => "حساب کی تصویری نمائش",
        Text::ResultMarked => "نتیجہ نمبر لائن پر نشان زد ہے",
        Text::SolvePrompt => "نمبر لائن دیکھنے کے لیے ایک اظہار حل کریں",
        Text::Divergence => "مراحل بائیں سے دائیں چلتے ہیں؛ نتیجہ عوامل کی ترجیح کے مطابق ہے۔",
        Text::LanguageName => "اردو",
        Text::Scale => "پیمانہ",
    }
}
