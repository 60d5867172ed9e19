use super::{BarreInfo, ChordShape};

/// Number of frets a diagram shows before the shape is shifted up the neck.
pub const DISPLAY_WINDOW_FRETS: u8 = 5;

/// Index of the placement that forms the primary barre.
///
/// The widest span wins; on a tie the earliest placement is kept.
pub fn primary_barre_index(shape: &ChordShape) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;

    for (index, placement) in shape.placements.iter().enumerate() {
        if !placement.is_barre() {
            continue;
        }
        let span = placement.span();
        if best.map_or(true, |(_, best_span)| span > best_span) {
            best = Some((index, span));
        }
    }

    best.map(|(index, _)| index)
}

pub fn detect_primary_barre(shape: &ChordShape) -> Option<BarreInfo> {
    let placement = &shape.placements[primary_barre_index(shape)?];
    Some(BarreInfo::from_placement(placement))
}

/// Shifts a shape played high on the neck into the display window.
///
/// Returns the displayed shape and the true starting fret. An offset of 1
/// means the shape is shown unshifted. Open and muted placements keep their
/// frets. Applying the function to its own output changes nothing.
pub fn transpose_for_display(shape: &ChordShape) -> (ChordShape, u8) {
    let fretted = shape
        .placements
        .iter()
        .filter(|placement| !placement.avoid && placement.fret > 0)
        .map(|placement| placement.fret);

    let (min, max) = fretted.fold((None, None), |(min, max): (Option<u8>, Option<u8>), fret| {
        (
            Some(min.map_or(fret, |current| current.min(fret))),
            Some(max.map_or(fret, |current| current.max(fret))),
        )
    });

    let (Some(min), Some(max)) = (min, max) else {
        return (shape.clone(), 1);
    };
    if max <= DISPLAY_WINDOW_FRETS {
        return (shape.clone(), 1);
    }

    let shift = min - 1;
    let mut displayed = shape.clone();
    for placement in displayed
        .placements
        .iter_mut()
        .filter(|placement| !placement.avoid && placement.fret > 0)
    {
        placement.fret -= shift;
    }

    (displayed, min)
}
