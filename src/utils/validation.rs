//! 表单校验，全部在发起网络请求之前完成

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ClientResult, FieldErrors};
use crate::models::{PlanRequest, SignupForm};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_login(email: &str, password: &str) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_signup(form: &SignupForm) -> ClientResult<()> {
    let mut errors = FieldErrors::new();

    if form.name.trim().is_empty() {
        errors.add("name", "Full name is required");
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        errors.add("email", "Email is invalid");
    }

    if form.password.is_empty() {
        errors.add("password", "Password is required");
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
    if form.password != form.confirm_password {
        errors.add("confirm_password", "Passwords do not match");
    }

    errors.into_result()
}

pub fn validate_plan(req: &PlanRequest) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if req.start_location.trim().is_empty() {
        errors.add("start_location", "Please enter your starting location.");
    }
    errors.into_result()
}

pub fn validate_activity(description: &str) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if description.trim().is_empty() {
        errors.add("description", "Please enter an activity description.");
    }
    errors.into_result()
}

pub fn validate_photo(file_name: &str, bytes: &[u8]) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if file_name.trim().is_empty() || bytes.is_empty() {
        errors.add("file", "Please choose an image file.");
    }
    errors.into_result()
}

pub fn validate_title(title: &str) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if title.trim().is_empty() {
        errors.add("title", "Please enter a title");
    }
    errors.into_result()
}

pub fn validate_token_amount(amount: i64) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if amount <= 0 {
        errors.add("amount", "Please enter a valid positive amount.");
    }
    errors.into_result()
}

pub fn validate_coupon(code: &str) -> ClientResult<()> {
    let mut errors = FieldErrors::new();
    if code.trim().is_empty() {
        errors.add("coupon_code", "Please enter a coupon code.");
    }
    errors.into_result()
}
