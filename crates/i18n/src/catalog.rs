//! Static translation catalog
//!
//! One row per key with all three renditions, so a key added without
//! every translation fails to compile rather than at runtime.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::language::Language;

/// key, Arabic, French, English
const ENTRIES: &[(&str, &str, &str, &str)] = &[
    // Auth flows
    (
        "auth.invalidCredentials",
        "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        "E-mail ou mot de passe incorrect",
        "Incorrect email or password",
    ),
    (
        "auth.emailNotConfirmed",
        "يرجى تأكيد بريدك الإلكتروني قبل تسجيل الدخول",
        "Veuillez confirmer votre e-mail avant de vous connecter",
        "Please confirm your email before signing in",
    ),
    (
        "auth.alreadyRegistered",
        "هذا البريد الإلكتروني مسجل مسبقاً",
        "Cet e-mail est déjà enregistré",
        "This email is already registered",
    ),
    (
        "auth.weakPassword",
        "كلمة المرور يجب أن تتكون من 6 أحرف على الأقل",
        "Le mot de passe doit contenir au moins 6 caractères",
        "Password must be at least 6 characters",
    ),
    (
        "auth.invalidEmail",
        "البريد الإلكتروني غير صالح",
        "Adresse e-mail invalide",
        "Invalid email address",
    ),
    (
        "auth.networkError",
        "تعذر الاتصال بالخادم، يرجى المحاولة مرة أخرى",
        "Connexion au serveur impossible, veuillez réessayer",
        "Could not reach the server, please try again",
    ),
    (
        "auth.rateLimited",
        "محاولات كثيرة جداً، يرجى الانتظار قليلاً",
        "Trop de tentatives, veuillez patienter",
        "Too many attempts, please wait a moment",
    ),
    (
        "auth.userNotFound",
        "لا يوجد حساب بهذا البريد الإلكتروني",
        "Aucun compte avec cet e-mail",
        "No account with this email",
    ),
    (
        "auth.sessionExpired",
        "انتهت صلاحية الجلسة، يرجى تسجيل الدخول مجدداً",
        "Session expirée, veuillez vous reconnecter",
        "Session expired, please sign in again",
    ),
    (
        "auth.notSignedIn",
        "يجب تسجيل الدخول أولاً",
        "Vous devez d'abord vous connecter",
        "You must sign in first",
    ),
    (
        "auth.confirmationSent",
        "تم إرسال رابط التأكيد إلى بريدك الإلكتروني",
        "Un lien de confirmation a été envoyé à votre e-mail",
        "A confirmation link was sent to your email",
    ),
    (
        "auth.accountCreated",
        "تم إنشاء الحساب بنجاح",
        "Compte créé avec succès",
        "Account created successfully",
    ),
    (
        "auth.passwordResetSent",
        "تم إرسال رابط استعادة كلمة المرور",
        "Un lien de réinitialisation a été envoyé",
        "A password reset link was sent",
    ),
    // Common actions
    ("common.save", "حفظ", "Enregistrer", "Save"),
    ("common.cancel", "إلغاء", "Annuler", "Cancel"),
    ("common.delete", "حذف", "Supprimer", "Delete"),
    ("common.edit", "تعديل", "Modifier", "Edit"),
    ("common.search", "بحث", "Rechercher", "Search"),
    ("common.loading", "جارٍ التحميل...", "Chargement...", "Loading..."),
    // Navigation
    ("nav.dashboard", "لوحة التحكم", "Tableau de bord", "Dashboard"),
    ("nav.lessons", "الدروس", "Leçons", "Lessons"),
    ("nav.students", "الطلاب", "Étudiants", "Students"),
    ("nav.materials", "المواد", "Supports", "Materials"),
    ("nav.notifications", "الإشعارات", "Notifications", "Notifications"),
    ("nav.profile", "الملف الشخصي", "Profil", "Profile"),
    ("nav.logout", "تسجيل الخروج", "Déconnexion", "Log out"),
    // Lessons
    ("lessons.create", "إنشاء درس", "Créer une leçon", "Create lesson"),
    ("lessons.publish", "نشر", "Publier", "Publish"),
    ("lessons.unpublish", "إلغاء النشر", "Dépublier", "Unpublish"),
    ("lessons.enroll", "التسجيل في الدرس", "S'inscrire à la leçon", "Enroll in lesson"),
    (
        "lessons.alreadyEnrolled",
        "أنت مسجل في هذا الدرس مسبقاً",
        "Vous êtes déjà inscrit à cette leçon",
        "You are already enrolled in this lesson",
    ),
    ("lessons.completed", "مكتمل", "Terminé", "Completed"),
    ("lessons.notFound", "الدرس غير موجود", "Leçon introuvable", "Lesson not found"),
    // Comments
    ("comments.add", "إضافة تعليق", "Ajouter un commentaire", "Add comment"),
    ("comments.edited", "معدّل", "modifié", "edited"),
    // Notifications
    (
        "notifications.markAllRead",
        "تعليم الكل كمقروء",
        "Tout marquer comme lu",
        "Mark all as read",
    ),
    (
        "notifications.empty",
        "لا توجد إشعارات",
        "Aucune notification",
        "No notifications",
    ),
    // Roles
    ("roles.student", "طالب", "Étudiant", "Student"),
    ("roles.teacher", "أستاذ", "Enseignant", "Teacher"),
    ("roles.admin", "مشرف", "Administrateur", "Admin"),
];

lazy_static! {
    static ref AR: HashMap<&'static str, &'static str> =
        ENTRIES.iter().map(|(k, ar, _, _)| (*k, *ar)).collect();
    static ref FR: HashMap<&'static str, &'static str> =
        ENTRIES.iter().map(|(k, _, fr, _)| (*k, *fr)).collect();
    static ref EN: HashMap<&'static str, &'static str> =
        ENTRIES.iter().map(|(k, _, _, en)| (*k, *en)).collect();
}

fn table(language: Language) -> &'static HashMap<&'static str, &'static str> {
    match language {
        Language::Ar => &AR,
        Language::Fr => &FR,
        Language::En => &EN,
    }
}

/// Resolve `key` in `language`, falling back to Arabic and finally to
/// the key itself.
pub fn translate(language: Language, key: &str) -> &str {
    if let Some(text) = table(language).get(key) {
        return text;
    }
    if let Some(text) = AR.get(key) {
        tracing::debug!(%language, key, "translation missing, falling back to Arabic");
        return text;
    }
    tracing::warn!(%language, key, "unknown translation key");
    key
}
