//! Localized labels and number formatting for rendered context blocks.

use moneyrag_core::knowledge::Language;

/// Text fragments used when rendering financial blocks and prompts.
#[derive(Debug)]
pub struct Labels {
    // ── Financial summary ─────────────────────────────────────────────
    pub balance: &'static str,
    pub this_month: &'static str,
    pub expense: &'static str,
    pub income: &'static str,
    pub top_spending: &'static str,

    // ── Budget status ─────────────────────────────────────────────────
    pub budget_header: &'static str,
    pub whole_account: &'static str,
    pub unnamed_category: &'static str,
    pub exceeded: &'static str,
    pub near_limit: &'static str,
    pub healthy: &'static str,

    // ── Comparison / trend ────────────────────────────────────────────
    pub vs_last_month: &'static str,
    pub spending: &'static str,
    pub increased: &'static str,
    pub decreased: &'static str,
    pub unchanged: &'static str,
    pub last_month: &'static str,
    pub trend: &'static str,
    pub trend_increasing: &'static str,
    pub trend_decreasing: &'static str,
    pub trend_stable: &'static str,
    pub three_month_average: &'static str,
    pub per_month: &'static str,

    // ── Category drill-down / pattern ─────────────────────────────────
    pub category_prefix: &'static str,
    pub category_suffix: &'static str,
    pub recent_transactions: &'static str,
    pub pattern_header: &'static str,
    pub daily_average: &'static str,
    pub largest_share: &'static str,

    // ── Prompts ───────────────────────────────────────────────────────
    pub persona: &'static str,
    pub knowledge_header: &'static str,
    pub related_knowledge_header: &'static str,
    pub financial_data_header: &'static str,
    pub user_financial_data_header: &'static str,
    pub comparison_header: &'static str,
    pub trend_header: &'static str,
    pub question_header: &'static str,
    pub user_question_header: &'static str,
    pub rules_header: &'static str,
    pub rules: &'static [&'static str],

    // ── Fallback advice ───────────────────────────────────────────────
    pub advice_header: &'static str,
    pub spending_advice: &'static [&'static str],
    pub saving_advice: &'static [&'static str],
    pub general_advice: &'static [&'static str],
}

pub const VIETNAMESE: Labels = Labels {
    balance: "Số dư ví hiện tại",
    this_month: "Tháng này",
    expense: "Chi tiêu",
    income: "Thu nhập",
    top_spending: "Top chi tiêu tháng này",

    budget_header: "[TÌNH TRẠNG NGÂN SÁCH]",
    whole_account: "Tổng",
    unnamed_category: "Danh mục",
    exceeded: "⚠️ VƯỢT",
    near_limit: "🟡 SẮP HẾT",
    healthy: "✅ ỔN",

    vs_last_month: "So với tháng trước",
    spending: "Chi tiêu",
    increased: "tăng",
    decreased: "giảm",
    unchanged: "không đổi",
    last_month: "Tháng trước",
    trend: "Xu hướng",
    trend_increasing: "Chi tiêu đang TĂNG liên tục 3 tháng",
    trend_decreasing: "Chi tiêu đang GIẢM liên tục 3 tháng",
    trend_stable: "Chi tiêu ổn định",
    three_month_average: "Trung bình 3 tháng",
    per_month: "tháng",

    category_prefix: "Chi tiêu",
    category_suffix: "tháng này",
    recent_transactions: "Giao dịch gần đây",
    pattern_header: "[THÓI QUEN CHI TIÊU]",
    daily_average: "Trung bình mỗi ngày",
    largest_share: "Chiếm nhiều nhất",

    persona: "Bạn là trợ lý tài chính cá nhân thông minh của ứng dụng MyMoney. \
              Hãy đưa ra lời khuyên dựa trên dữ liệu thực tế của người dùng và kiến thức tài chính bên dưới.",
    knowledge_header: "[KIẾN THỨC TÀI CHÍNH]",
    related_knowledge_header: "[KIẾN THỨC TÀI CHÍNH LIÊN QUAN]",
    financial_data_header: "[DỮ LIỆU TÀI CHÍNH]",
    user_financial_data_header: "[DỮ LIỆU TÀI CHÍNH NGƯỜI DÙNG]",
    comparison_header: "[SO SÁNH]",
    trend_header: "[XU HƯỚNG]",
    question_header: "[CÂU HỎI]",
    user_question_header: "[CÂU HỎI NGƯỜI DÙNG]",
    rules_header: "Quy tắc:",
    rules: &[
        "Trả lời ngắn gọn (3-5 câu), tập trung vào hành động cụ thể",
        "Sử dụng số liệu thực từ dữ liệu người dùng khi được hỏi",
        "Áp dụng kiến thức tài chính để đưa ra lời khuyên phù hợp",
        "Nếu không có đủ dữ liệu, hãy đưa ra lời khuyên chung",
    ],

    advice_header: "💡 Lời khuyên:",
    spending_advice: &[
        "Theo dõi chi tiêu hàng ngày để kiểm soát tốt hơn",
        "Ưu tiên các khoản chi tiêu cần thiết",
        "Cân nhắc giảm chi tiêu không cần thiết",
    ],
    saving_advice: &[
        "Đặt mục tiêu tiết kiệm cụ thể và khả thi",
        "Tự động chuyển tiền tiết kiệm mỗi tháng",
        "Áp dụng quy tắc 50/30/20",
    ],
    general_advice: &[
        "Theo dõi tài chính đều đặn",
        "Cân bằng giữa chi tiêu và tiết kiệm",
        "Đặt mục tiêu tài chính rõ ràng",
    ],
};

pub const ENGLISH: Labels = Labels {
    balance: "Current wallet balance",
    this_month: "This month",
    expense: "Expenses",
    income: "Income",
    top_spending: "Top spending this month",

    budget_header: "[BUDGET STATUS]",
    whole_account: "Overall",
    unnamed_category: "Category",
    exceeded: "⚠️ EXCEEDED",
    near_limit: "🟡 NEAR LIMIT",
    healthy: "✅ OK",

    vs_last_month: "Compared with last month",
    spending: "Spending",
    increased: "up",
    decreased: "down",
    unchanged: "unchanged",
    last_month: "Last month",
    trend: "Trend",
    trend_increasing: "Spending has RISEN for 3 months in a row",
    trend_decreasing: "Spending has FALLEN for 3 months in a row",
    trend_stable: "Spending is stable",
    three_month_average: "3-month average",
    per_month: "month",

    category_prefix: "Spending on",
    category_suffix: "this month",
    recent_transactions: "Recent transactions",
    pattern_header: "[SPENDING PATTERN]",
    daily_average: "Average per day",
    largest_share: "Largest share",

    persona: "You are the smart personal finance assistant of the MyMoney app. \
              Give advice based on the user's real data and the financial knowledge below.",
    knowledge_header: "[FINANCIAL KNOWLEDGE]",
    related_knowledge_header: "[RELATED FINANCIAL KNOWLEDGE]",
    financial_data_header: "[FINANCIAL DATA]",
    user_financial_data_header: "[USER FINANCIAL DATA]",
    comparison_header: "[COMPARISON]",
    trend_header: "[TREND]",
    question_header: "[QUESTION]",
    user_question_header: "[USER QUESTION]",
    rules_header: "Rules:",
    rules: &[
        "Answer briefly (3-5 sentences), focused on concrete actions",
        "Use real figures from the user's data when asked",
        "Apply the financial knowledge to give fitting advice",
        "If there is not enough data, give general advice",
    ],

    advice_header: "💡 Advice:",
    spending_advice: &[
        "Track daily spending to stay in control",
        "Prioritize essential expenses",
        "Consider cutting unnecessary spending",
    ],
    saving_advice: &[
        "Set a concrete, achievable savings goal",
        "Automate a monthly transfer to savings",
        "Apply the 50/30/20 rule",
    ],
    general_advice: &[
        "Review your finances regularly",
        "Balance spending and saving",
        "Set clear financial goals",
    ],
};

/// Labels for the given output language.
pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::English => &ENGLISH,
        Language::Vietnamese => &VIETNAMESE,
    }
}

/// Round to a whole number and group thousands with commas: `1234567.4` → `1,234,567`.
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits;
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// `format_amount` followed by the currency suffix.
pub fn format_money(amount: f64, currency: &str) -> String {
    if currency.is_empty() {
        format_amount(amount)
    } else {
        format!("{} {currency}", format_amount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(format_amount(850_000.0), "850,000");
    }

    #[test]
    fn rounds_and_keeps_sign() {
        assert_eq!(format_amount(999.6), "1,000");
        assert_eq!(format_amount(-1_500_000.0), "-1,500,000");
        assert_eq!(format_amount(-0.2), "0");
    }

    #[test]
    fn money_appends_currency() {
        assert_eq!(format_money(1_000_000.0, "VNĐ"), "1,000,000 VNĐ");
        assert_eq!(format_money(12.0, ""), "12");
    }

    #[test]
    fn both_languages_have_four_rules() {
        assert_eq!(labels(Language::Vietnamese).rules.len(), 4);
        assert_eq!(labels(Language::English).rules.len(), 4);
        assert_eq!(labels(Language::English).budget_header, "[BUDGET STATUS]");
    }
}
