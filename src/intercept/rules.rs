//! intercept::rules
//!
//! The closed set of destructive controls and the labels they go by.
//!
//! The host's display language is unknown, so every table is checked on
//! every scan. Matching is case-sensitive; variants that differ only in case
//! are listed separately.

use std::fmt;

use crate::core::config::RedirectConfig;

/// Labels for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleLabels {
    pub locale: &'static str,
    pub labels: &'static [&'static str],
}

const fn locale(locale: &'static str, labels: &'static [&'static str]) -> LocaleLabels {
    LocaleLabels { locale, labels }
}

/// Sign-out control labels.
pub const SIGN_OUT_LABELS: &[LocaleLabels] = &[
    locale("zh-CN", &["注销退出", "注销", "退出登录"]),
    locale("zh-TW", &["登出", "註銷"]),
    locale("en", &["Sign Out", "Sign out", "Log Out", "Log out", "Logout"]),
    locale("fr", &["Se déconnecter", "Déconnexion"]),
    locale("de", &["Abmelden"]),
    locale("es", &["Cerrar sesión"]),
    locale("it", &["Esci", "Disconnetti"]),
    locale("pt", &["Terminar sessão", "Sair"]),
    locale("ja", &["サインアウト", "ログアウト"]),
    locale("ko", &["로그아웃"]),
    locale("ru", &["Выйти", "Выход"]),
    locale("nl", &["Afmelden", "Uitloggen"]),
];

/// Switch-user control labels.
pub const SWITCH_USER_LABELS: &[LocaleLabels] = &[
    locale("zh-CN", &["切换用户"]),
    locale("zh-TW", &["切換使用者", "切換用戶"]),
    locale("en", &["Switch User", "Switch user"]),
    locale("fr", &["Changer d'utilisateur"]),
    locale("de", &["Benutzer wechseln"]),
    locale("es", &["Cambiar de usuario", "Cambiar usuario"]),
    locale("it", &["Cambia utente"]),
    locale("pt", &["Trocar de usuário", "Mudar de utilizador"]),
    locale("ja", &["ユーザーの切り替え", "ユーザー切り替え"]),
    locale("ko", &["사용자 전환"]),
    locale("ru", &["Сменить пользователя"]),
    locale("nl", &["Gebruiker wisselen"]),
];

/// Which destructive control a rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    SignOut,
    SwitchUser,
}

impl RuleKind {
    pub fn table(self) -> &'static [LocaleLabels] {
        match self {
            RuleKind::SignOut => SIGN_OUT_LABELS,
            RuleKind::SwitchUser => SWITCH_USER_LABELS,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::SignOut => f.write_str("sign-out"),
            RuleKind::SwitchUser => f.write_str("switch-user"),
        }
    }
}

/// A destructive control and where clicking it should go instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptRule {
    pub kind: RuleKind,
    labels: Vec<&'static str>,
    pub target: String,
}

impl InterceptRule {
    /// A rule using every locale's labels for `kind`.
    pub fn new(kind: RuleKind, target: impl Into<String>) -> Self {
        let labels = kind
            .table()
            .iter()
            .flat_map(|l| l.labels.iter().copied())
            .collect();
        Self {
            kind,
            labels,
            target: target.into(),
        }
    }

    /// The sign-out rule followed by the switch-user rule.
    pub fn standard(redirects: &RedirectConfig) -> Vec<InterceptRule> {
        vec![
            InterceptRule::new(RuleKind::SignOut, redirects.sign_out.clone()),
            InterceptRule::new(RuleKind::SwitchUser, redirects.switch_user.clone()),
        ]
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// Whether `text` contains any label.
    pub fn matches_text(&self, text: &str) -> bool {
        !text.is_empty() && self.labels.iter().any(|label| text.contains(label))
    }
}
