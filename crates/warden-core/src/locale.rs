//! Built-in string catalog.
//!
//! Strings are compiled into the binary. Lookups fall back to the default
//! language and finally to the key itself, so a missing translation shows
//! up as a readable key instead of an empty message.

use std::collections::HashMap;

/// The language used when a chat has no preference.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A language the bot can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

/// Source of localized strings.
pub trait Localizer: Send + Sync {
    /// Raw template for `key` in `lang`.
    fn text(&self, lang: &str, key: &str) -> String;

    /// Whether `lang` has a catalog.
    fn supports(&self, lang: &str) -> bool;

    /// Languages in display order.
    fn languages(&self) -> Vec<Language>;

    /// Template for `key` with `{name}` placeholders substituted.
    fn format(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        format_string(&self.text(lang, key), args)
    }
}

/// Replace each `{name}` in `template` with its value.
///
/// Runs in a single pass over the template, so braces inside substituted
/// values are never expanded. Unknown placeholders are kept as written.
pub fn format_string(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            args.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const EN_US: &[(&str, &str)] = &[
    // gate
    ("no_admin_error", "You need to be an admin to do this."),
    ("no_permission_error", "You don't have the required permissions to perform this action.\nMissing: {permissions}"),
    ("private_not_allowed", "This command can only be used in groups."),
    ("handler_error", "ERROR: {error}"),
    ("cooldown_warning", "Slow down {mention}, wait {seconds}s before sending another command."),
    // admin
    ("user_not_found", "I can't find that user. Reply to their message or give their numeric id."),
    ("ban_self_err", "I can't ban myself."),
    ("ban_sudo_err", "I can't ban a sudo user."),
    ("ban_admin_err", "I can't ban an admin."),
    ("ban_msg", "Banned {mention} [<code>{id}</code>] by {banner}."),
    ("banner_time", "\nBanned for: {val}"),
    ("banned_reason", "\nReason: {reas}"),
    ("unban_success", "Unbanned {umention}."),
    ("no_ban_permission", "I don't have permission to ban users here."),
    ("kick_self_err", "I can't kick myself."),
    ("kick_sudo_err", "I can't kick a sudo user."),
    ("kick_admin_err", "I can't kick an admin."),
    ("kick_msg", "Kicked {mention} [<code>{id}</code>] by {kicker}.\nReason: {reasonmsg}"),
    ("mute_self_err", "I can't mute myself."),
    ("mute_sudo_err", "I can't mute a sudo user."),
    ("mute_admin_err", "I can't mute an admin."),
    ("muted_msg", "Muted {mention} by {muter}."),
    ("muted_time", "\nMuted for: {val}"),
    ("unmute_msg", "Unmuted {umention}."),
    ("rmmute_msg", "Unmuted by {mention}."),
    ("unban_msg", "Unbanned by {mention}."),
    ("warn_self_err", "I can't warn myself."),
    ("warn_sudo_err", "I can't warn a sudo user."),
    ("warn_admin_err", "I can't warn an admin."),
    ("warn_msg", "{mention} warned by {warner}.\nReason: {reas}\nWarns: {twarn}/3"),
    ("exceed_warn_msg", "Warnings exceeded, {mention} has been banned."),
    ("rmwarn_btn", "Remove warning"),
    ("unwarn_msg", "Warning removed by {mention}."),
    ("user_no_warn", "{mention} has no warnings."),
    ("reply_to_rm_warn", "Reply to a message to remove the user's warnings."),
    ("rmwarn_msg", "Removed the warnings of {mention}."),
    ("ch_warn_msg", "{mention} has {warns}/3 warnings."),
    ("no_reason", "No reason provided."),
    ("invalid_duration", "Invalid duration. Use a number followed by m, h, d or w (e.g. 30m)."),
    ("purge_no_reply", "Reply to a message to purge from."),
    ("purge_success", "Deleted {del_total} messages."),
    ("delete_no_reply", "Reply to a message to delete it."),
    ("no_delete_perm", "I can't delete messages here."),
    ("pin_no_reply", "Reply to a message to pin it."),
    ("pin_success", "Pinned the message."),
    ("unpin_success", "Unpinned the message."),
    ("pin_no_perm", "I don't have permission to pin messages here."),
    ("promote_self_err", "I can't promote myself."),
    ("no_promote_perm", "I don't have permission to promote members."),
    ("normal_promote", "Promoted {umention}."),
    ("full_promote", "Fully promoted {umention}."),
    ("demote_self_err", "I can't demote myself."),
    ("demote_sudo_err", "I can't demote a sudo user."),
    ("demote_msg", "Demoted {umention}."),
    ("report_no_reply", "Reply to a message to report it."),
    ("report_self_err", "You can't report yourself."),
    ("reported_is_admin", "That user is an admin."),
    ("report_msg", "Reported {user_mention} to the admins."),
    ("unmute_btn", "Unmute"),
    ("unban_btn", "Unban"),
    // lang_setting
    ("language_changer_private", "Select the language for the bot:"),
    ("language_changer_chat", "Select the language for this chat:"),
    ("language_changed_successfully", "Language changed successfully."),
    ("language_unknown", "That language is not available."),
    // general
    ("back_btn", "Back"),
    ("language_btn", "🌐 Language"),
    ("start_msg", "Hi! I help admins moderate this group. Send /help to see what I can do."),
];

const ID_ID: &[(&str, &str)] = &[
    ("no_admin_error", "Kamu harus menjadi admin untuk melakukan ini."),
    ("no_permission_error", "Kamu tidak memiliki izin yang diperlukan untuk melakukan tindakan ini.\nKurang: {permissions}"),
    ("private_not_allowed", "Perintah ini hanya bisa digunakan di grup."),
    ("handler_error", "ERROR: {error}"),
    ("cooldown_warning", "Pelan-pelan {mention}, tunggu {seconds} detik sebelum mengirim perintah lagi."),
    ("user_not_found", "Pengguna tidak ditemukan. Balas pesannya atau berikan id numeriknya."),
    ("ban_self_err", "Aku tidak bisa memblokir diriku sendiri."),
    ("ban_sudo_err", "Aku tidak bisa memblokir pengguna sudo."),
    ("ban_admin_err", "Aku tidak bisa memblokir admin."),
    ("ban_msg", "{mention} [<code>{id}</code>] diblokir oleh {banner}."),
    ("banner_time", "\nDiblokir selama: {val}"),
    ("banned_reason", "\nAlasan: {reas}"),
    ("unban_success", "{umention} tidak lagi diblokir."),
    ("no_ban_permission", "Aku tidak punya izin untuk memblokir pengguna di sini."),
    ("kick_self_err", "Aku tidak bisa menendang diriku sendiri."),
    ("kick_sudo_err", "Aku tidak bisa menendang pengguna sudo."),
    ("kick_admin_err", "Aku tidak bisa menendang admin."),
    ("kick_msg", "{mention} [<code>{id}</code>] ditendang oleh {kicker}.\nAlasan: {reasonmsg}"),
    ("mute_self_err", "Aku tidak bisa membisukan diriku sendiri."),
    ("mute_sudo_err", "Aku tidak bisa membisukan pengguna sudo."),
    ("mute_admin_err", "Aku tidak bisa membisukan admin."),
    ("muted_msg", "{mention} dibisukan oleh {muter}."),
    ("muted_time", "\nDibisukan selama: {val}"),
    ("unmute_msg", "{umention} tidak lagi dibisukan."),
    ("rmmute_msg", "Bisu dicabut oleh {mention}."),
    ("unban_msg", "Blokir dicabut oleh {mention}."),
    ("warn_self_err", "Aku tidak bisa memperingatkan diriku sendiri."),
    ("warn_sudo_err", "Aku tidak bisa memperingatkan pengguna sudo."),
    ("warn_admin_err", "Aku tidak bisa memperingatkan admin."),
    ("warn_msg", "{mention} diperingatkan oleh {warner}.\nAlasan: {reas}\nPeringatan: {twarn}/3"),
    ("exceed_warn_msg", "Peringatan terlampaui, {mention} telah diblokir."),
    ("rmwarn_btn", "Hapus peringatan"),
    ("unwarn_msg", "Peringatan dihapus oleh {mention}."),
    ("user_no_warn", "{mention} tidak memiliki peringatan."),
    ("reply_to_rm_warn", "Balas pesan untuk menghapus peringatan pengguna."),
    ("rmwarn_msg", "Peringatan {mention} telah dihapus."),
    ("ch_warn_msg", "{mention} memiliki {warns}/3 peringatan."),
    ("no_reason", "Tidak ada alasan."),
    ("invalid_duration", "Durasi tidak valid. Gunakan angka diikuti m, h, d atau w (misal 30m)."),
    ("purge_no_reply", "Balas pesan untuk mulai menghapus."),
    ("purge_success", "{del_total} pesan dihapus."),
    ("delete_no_reply", "Balas pesan untuk menghapusnya."),
    ("no_delete_perm", "Aku tidak bisa menghapus pesan di sini."),
    ("pin_no_reply", "Balas pesan untuk menyematkannya."),
    ("pin_success", "Pesan disematkan."),
    ("unpin_success", "Sematan pesan dilepas."),
    ("pin_no_perm", "Aku tidak punya izin untuk menyematkan pesan di sini."),
    ("promote_self_err", "Aku tidak bisa mempromosikan diriku sendiri."),
    ("no_promote_perm", "Aku tidak punya izin untuk mempromosikan anggota."),
    ("normal_promote", "{umention} dipromosikan."),
    ("full_promote", "{umention} dipromosikan dengan semua hak."),
    ("demote_self_err", "Aku tidak bisa menurunkan diriku sendiri."),
    ("demote_sudo_err", "Aku tidak bisa menurunkan pengguna sudo."),
    ("demote_msg", "{umention} diturunkan."),
    ("report_no_reply", "Balas pesan untuk melaporkannya."),
    ("report_self_err", "Kamu tidak bisa melaporkan dirimu sendiri."),
    ("reported_is_admin", "Pengguna itu adalah admin."),
    ("report_msg", "{user_mention} dilaporkan ke admin."),
    ("unmute_btn", "Buka bisu"),
    ("unban_btn", "Buka blokir"),
    ("language_changer_private", "Pilih bahasa untuk bot:"),
    ("language_changer_chat", "Pilih bahasa untuk obrolan ini:"),
    ("language_changed_successfully", "Bahasa berhasil diubah."),
    ("language_unknown", "Bahasa itu tidak tersedia."),
    ("back_btn", "Kembali"),
    ("language_btn", "🌐 Bahasa"),
    ("start_msg", "Hai! Aku membantu admin mengelola grup ini. Kirim /help untuk melihat perintahku."),
];

/// The compiled-in catalog.
pub struct Catalog {
    languages: Vec<Language>,
    strings: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    default_language: String,
}

impl Catalog {
    /// English and Indonesian, English as default.
    pub fn builtin() -> Self {
        let languages = vec![
            Language {
                code: "en-US",
                name: "English",
                flag: "🇺🇸",
            },
            Language {
                code: "id-ID",
                name: "Bahasa Indonesia",
                flag: "🇮🇩",
            },
        ];

        let mut strings = HashMap::new();
        strings.insert("en-US", EN_US.iter().copied().collect());
        strings.insert("id-ID", ID_ID.iter().copied().collect());

        Self {
            languages,
            strings,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Use `lang` as the fallback language. Unknown codes are ignored.
    pub fn with_default_language(mut self, lang: &str) -> Self {
        if self.strings.contains_key(lang) {
            self.default_language = lang.to_string();
        }
        self
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Localizer for Catalog {
    fn text(&self, lang: &str, key: &str) -> String {
        self.strings
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.strings
                    .get(self.default_language.as_str())
                    .and_then(|table| table.get(key))
            })
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    fn supports(&self, lang: &str) -> bool {
        self.strings.contains_key(lang)
    }

    fn languages(&self) -> Vec<Language> {
        self.languages.clone()
    }
}
