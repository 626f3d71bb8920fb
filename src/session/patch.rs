// 后端只返回片段（而不是完整用户）时，在本地缓存副本上打补丁

use serde_json::{Value, json};

use crate::models::CachedSession;

/// 响应体是否是完整的用户对象
pub(crate) fn looks_like_user(payload: &Value) -> bool {
    payload.as_object().is_some_and(|map| {
        map.contains_key("tours") || map.contains_key("email") || map.contains_key("id")
    })
}

fn id_matches(value: Option<&Value>, id: i64) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_i64() == Some(id),
        Some(Value::String(s)) => s.trim() == id.to_string(),
        _ => false,
    }
}

/// 把新照片追加到对应的 day，返回是否找到该 day
pub(crate) fn append_photo(session: &mut CachedSession, day_id: i64, payload: &Value) -> bool {
    let photo_id = payload
        .get("photoId")
        .or_else(|| payload.get("id"))
        .cloned()
        .unwrap_or_else(|| json!(chrono::Utc::now().timestamp_millis()));
    let link = payload
        .get("photoUrl")
        .or_else(|| payload.get("url"))
        .or_else(|| payload.get("link"))
        .cloned()
        .unwrap_or(Value::Null);

    let days = session
        .tours
        .iter_mut()
        .filter_map(|tour| tour.get_mut("days").and_then(Value::as_array_mut))
        .flatten();

    for day in days {
        if !id_matches(day.get("id"), day_id) {
            continue;
        }
        let Some(day) = day.as_object_mut() else {
            continue;
        };
        let photos = day
            .entry("photos")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !photos.is_array() {
            *photos = Value::Array(Vec::new());
        }
        if let Some(photos) = photos.as_array_mut() {
            photos.push(json!({ "id": photo_id, "link": link }));
        }
        return true;
    }
    false
}

/// 更新行程标题，返回是否找到该行程
pub(crate) fn rename_tour(session: &mut CachedSession, tour_id: i64, title: &str) -> bool {
    for tour in session.tours.iter_mut() {
        if !id_matches(tour.get("id"), tour_id) {
            continue;
        }
        if let Some(tour) = tour.as_object_mut() {
            tour.insert("title".into(), Value::String(title.to_string()));
            return true;
        }
    }
    false
}
