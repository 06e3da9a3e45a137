use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Frames in an input of `input_len` bytes made of `frame_size`-byte frames.
pub fn estimate_total_frames(input_len: Option<u64>, frame_size: usize) -> Option<u64> {
    input_len
        .filter(|_| frame_size > 0)
        .map(|len| len / frame_size as u64)
}

pub fn create_progress_bar(multi: &MultiProgress, total_frames: Option<u64>, message: &str) -> ProgressBar {
    let pb = if let Some(total) = total_frames {
        let pb = multi.add(ProgressBar::new(total));
        match ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        ) {
            Ok(style) => pb.set_style(style),
            Err(e) => log::debug!("Progress style: {e}"),
        }

        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        match ProgressStyle::with_template("{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}") {
            Ok(style) => pb.set_style(style),
            Err(e) => log::debug!("Progress style: {e}"),
        }

        pb
    };
    pb.set_message(message.to_string());
    pb
}
