//! Session assembly: due reviews first, unseen words fill the remainder,
//! then one uniform shuffle. Pure given the two candidate lists; the engine
//! owns the fetching and the due/new classification.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::SessionItem;

/// Combines due and unseen candidates into a session of at most `size`
/// items. Due items are never displaced by new ones; shortfalls shrink the
/// session instead of erroring.
pub fn assemble_session<R: Rng + ?Sized>(
    mut due: Vec<SessionItem>,
    fresh: Vec<SessionItem>,
    size: usize,
    rng: &mut R,
) -> Vec<SessionItem> {
    due.truncate(size);
    let remaining = size - due.len();

    let mut items = due;
    items.extend(fresh.into_iter().take(remaining));
    items.shuffle(rng);
    items
}
