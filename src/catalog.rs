use log::{debug, warn};

use crate::{
    models::{ClipQuery, ClipSet},
    platform::ClipApi,
};

/// Pages through the listing endpoint and keeps the clips made by `query.creator_id`.
///
/// The endpoint only filters by broadcaster and time window, so creator filtering happens
/// here, page by page. Paging stops when a page carries no cursor, when a page request
/// fails, or once `query.limit` matching clips have been collected. A failed page is not
/// an error: whatever was gathered so far is returned with [`ClipSet::interrupted`] set.
pub async fn list_clips<A: ClipApi>(api: &A, query: &ClipQuery) -> ClipSet {
    let mut clips = Vec::new();
    let mut interrupted = false;
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = match api.clip_page(query, cursor.take()).await {
            Ok(page) => page,
            Err(err) => {
                warn!("Clip listing stopped after {pages} page(s): {err}");
                interrupted = true;
                break;
            }
        };
        pages += 1;

        let before = clips.len();
        clips.extend(
            page.clips
                .into_iter()
                .filter(|clip| clip.creator_id == query.creator_id),
        );
        debug!("Page {pages}: kept {} clip(s)", clips.len() - before);

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }

        if query.limit.is_some_and(|limit| clips.len() >= limit) {
            break;
        }
    }

    if let Some(limit) = query.limit {
        clips.truncate(limit);
    }

    ClipSet { clips, interrupted }
}
