// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
//

#[cfg(test)]
mod tests {
    use integration_tests::*;
    use solar_os::display::{FramebufferGeometry, FramebufferSurface};
    use solar_os::filesystem::staging_path;
    use solar_os::process::CommandJob;
    use solar_rto::prelude::*;

    use image::{Rgb, RgbImage};
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    fn solid_png(path: &Path, rgb: [u8; 3]) {
        RgbImage::from_pixel(2, 1, Rgb(rgb)).save(path).unwrap();
    }

    fn framebuffer_shows(path: &Path, bgra: [u8; 4]) -> bool {
        std::fs::read(path)
            .map(|content| content == [bgra, bgra].concat())
            .unwrap_or(false)
    }

    #[test]
    fn touch_moves_framebuffer_to_next_image() {
        let dir = tempfile::tempdir().unwrap();
        let red = dir.path().join("red.png");
        let blue = dir.path().join("blue.png");
        solid_png(&red, [255, 0, 0]);
        solid_png(&blue, [0, 0, 255]);

        let fb = dir.path().join("fb0");
        std::fs::write(&fb, [0u8; 8]).unwrap();
        let surface =
            FramebufferSurface::with_geometry(&fb, FramebufferGeometry::packed(2, 1, 32).unwrap()).unwrap();

        let settings = DisplaySettings {
            rotation: Duration::from_secs(10),
            tick: Duration::from_millis(10),
            rate_limit: Duration::from_millis(50),
        };
        let display = DisplayLoop::new(
            vec![ImageSlot::new("red", &red), ImageSlot::new("blue", &blue)],
            Box::new(surface),
            settings,
        )
        .unwrap();

        let context = Context::new();
        let running = {
            let context = context.clone();
            thread::spawn(move || display.run(context))
        };

        assert!(wait_until(Duration::from_secs(5), || framebuffer_shows(&fb, [0, 0, 255, 255])));

        context.events().push(touch()).unwrap();
        assert!(wait_until(Duration::from_secs(5), || framebuffer_shows(&fb, [255, 0, 0, 255])));

        context.shutdown();
        assert!(running.join().unwrap().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn failed_jobs_keep_their_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let earth = dir.path().join("earth.png");
        let moon = dir.path().join("moon.png");
        let mars = dir.path().join("mars.png");
        for path in [&earth, &moon, &mars] {
            std::fs::write(path, "old").unwrap();
        }

        let job = |script: &str| -> Box<dyn Regenerate> {
            Box::new(StagedCommand::new(
                CommandJob::new(["sh", "-c", script, "{output}"]).unwrap(),
            ))
        };

        let refresher = Refresher::new(vec![
            SlotJob::new(ImageSlot::new("earth", &earth), job("printf new > \"$0\"")),
            SlotJob::new(ImageSlot::new("moon", &moon), job("printf half > \"$0\"; exit 3")),
            SlotJob::new(ImageSlot::new("mars", &mars), job("true")),
        ]);

        assert_eq!(
            refresher.refresh_once(&Context::new()).unwrap(),
            RefreshOutcome::Refreshed {
                succeeded: 1,
                failed: 2
            }
        );

        assert_eq!(std::fs::read_to_string(&earth).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(&moon).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(&mars).unwrap(), "old");
        for path in [&earth, &moon, &mars] {
            assert!(!staging_path(path).exists());
        }
    }
}
